pub mod forms;
pub mod state;

use std::{path::PathBuf, time::Duration};

use api_types::{auth::AuthResponse, upload::UploadedFile};
use chrono::{Datelike, Utc};
use chrono_tz::Tz;
use crossterm::event::{self, Event, KeyEvent};
use engine::{
    Category, Currency, EngineError, FetchOutcome, FetchTicket, Filter, ListController, ListPage,
    ListSource, PaymentMethod, Resource, Session, SessionStore, Transaction, WireRecord,
    listing::fetch_all,
    query::{dashboard_query, lookup_query},
};
use tokio::sync::mpsc;

use crate::{
    client::{Authed, Client, ClientError, user_message},
    config::AppConfig,
    error::{AppError, Result},
    ui::{
        self,
        keymap::{AppAction, map_key},
    },
};

use forms::{FormState, FormTarget};
pub use state::{
    AppState, ListView, Lookups, Modal, PendingDelete, Screen, Section, ToastLevel, ToastState,
};

type ClientResult<T> = std::result::Result<T, ClientError>;

/// Results of background tasks, delivered to the event loop.
#[derive(Debug)]
enum Message {
    SignedIn(ClientResult<AuthResponse>),
    Registered(ClientResult<AuthResponse>),
    PasswordChanged(ClientResult<AuthResponse>),
    Transactions(FetchTicket, ClientResult<ListPage<Transaction>>),
    Categories(FetchTicket, ClientResult<ListPage<Category>>),
    Currencies(FetchTicket, ClientResult<ListPage<Currency>>),
    PaymentMethods(FetchTicket, ClientResult<ListPage<PaymentMethod>>),
    Dashboard(ClientResult<Vec<Transaction>>),
    Lookups(ClientResult<Lookups>),
    Editable(ClientResult<Editable>),
    Saved(Resource, ClientResult<()>),
    Deleted(Resource, u64, ClientResult<()>),
}

/// A record fetched to prefill an edit form.
#[derive(Debug)]
enum Editable {
    Transaction(Transaction),
    Category(Category),
    Currency(Currency),
    PaymentMethod(PaymentMethod),
}

pub struct App {
    config: AppConfig,
    client: Client,
    sessions: SessionStore,
    tz: Tz,
    tx: mpsc::UnboundedSender<Message>,
    rx: mpsc::UnboundedReceiver<Message>,
    pub state: AppState,
    should_quit: bool,
}

impl App {
    pub fn new(config: AppConfig) -> Result<Self> {
        let client = Client::new(&config.base_url)?;
        let tz = config.tz()?;
        let year = Utc::now().with_timezone(&tz).year();
        let state = AppState::new(&config.identifier, &config.base_url, config.page_size, year);
        let (tx, rx) = mpsc::unbounded_channel();

        Ok(Self {
            config,
            client,
            sessions: SessionStore::new(),
            tz,
            tx,
            rx,
            state,
            should_quit: false,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut terminal = ui::setup_terminal()?;
        let result = self.event_loop(&mut terminal).await;
        ui::restore_terminal(&mut terminal)?;
        result
    }

    async fn event_loop(&mut self, terminal: &mut ui::Terminal) -> Result<()> {
        let tick_rate = Duration::from_millis(100);

        while !self.should_quit {
            self.drain_messages();
            self.expire_toast();
            self.ensure_fetch();

            terminal
                .draw(|frame| ui::render(frame, &self.state))
                .map_err(|err| AppError::Terminal(err.to_string()))?;

            if event::poll(tick_rate)? {
                match event::read()? {
                    Event::Key(key) => self.handle_key(key),
                    Event::Resize(_, _) => {}
                    _ => {}
                }
            }
        }

        Ok(())
    }

    fn drain_messages(&mut self) {
        while let Ok(message) = self.rx.try_recv() {
            self.apply(message);
        }
    }

    fn expire_toast(&mut self) {
        if self
            .state
            .toast
            .as_ref()
            .is_some_and(|toast| toast.expires_at <= std::time::Instant::now())
        {
            self.state.toast = None;
        }
    }

    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = Message> + Send + 'static,
    {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            // The receiver only goes away when the app is closing.
            let _ = tx.send(task.await);
        });
    }

    fn authed(&self) -> Option<Authed> {
        self.sessions
            .current()
            .ok()
            .map(|session| Authed::new(self.client.clone(), session.clone()))
    }

    fn user_id(&self) -> Option<u64> {
        self.sessions.current().ok().map(|session| session.user_id())
    }

    /// Starts the fetch of the visible list when its page is outdated.
    fn ensure_fetch(&mut self) {
        if self.state.screen != Screen::Shell {
            return;
        }
        let (Some(user_id), Some(authed)) = (self.user_id(), self.authed()) else {
            return;
        };

        match self.state.section {
            Section::Transactions => {
                spawn_list(self, user_id, authed, |s| &mut s.transactions, Message::Transactions)
            }
            Section::Categories => {
                spawn_list(self, user_id, authed, |s| &mut s.categories, Message::Categories)
            }
            Section::Currencies => {
                spawn_list(self, user_id, authed, |s| &mut s.currencies, Message::Currencies)
            }
            Section::PaymentMethods => spawn_list(
                self,
                user_id,
                authed,
                |s| &mut s.payment_methods,
                Message::PaymentMethods,
            ),
            Section::Dashboard | Section::Account => {}
        }
    }

    fn refresh_dashboard(&mut self) {
        let (Some(user_id), Some(authed)) = (self.user_id(), self.authed()) else {
            return;
        };
        self.state.dashboard.loading = true;
        self.spawn(async move {
            Message::Dashboard(
                fetch_all(&authed, Resource::Transactions, dashboard_query(user_id)).await,
            )
        });
    }

    fn refresh_lookups(&mut self) {
        let (Some(user_id), Some(authed)) = (self.user_id(), self.authed()) else {
            return;
        };
        self.spawn(async move {
            let query = lookup_query(user_id);
            let result = async {
                Ok::<_, ClientError>(Lookups {
                    currencies: fetch_all(&authed, Resource::Currencies, query.clone()).await?,
                    categories: fetch_all(&authed, Resource::Categories, query.clone()).await?,
                    payment_methods: fetch_all(&authed, Resource::PaymentMethods, query).await?,
                })
            }
            .await;
            Message::Lookups(result)
        });
    }

    fn apply(&mut self, message: Message) {
        match message {
            Message::SignedIn(result) | Message::Registered(result) => {
                self.state.auth_form.submitting = false;
                match result {
                    Ok(response) => self.on_signed_in(response),
                    Err(err) => self.state.toast(ToastLevel::Error, user_message(&err)),
                }
            }
            Message::PasswordChanged(result) => match result {
                Ok(_) => {
                    self.sign_out();
                    self.state
                        .toast(ToastLevel::Success, "Password changed, please sign in again");
                }
                Err(err) => self.form_failed(&err),
            },
            Message::Transactions(ticket, result) => {
                let outcome = self.state.transactions.controller.complete_fetch(&ticket, result);
                self.state.transactions.clamp_selection();
                self.report_fetch(outcome);
            }
            Message::Categories(ticket, result) => {
                let outcome = self.state.categories.controller.complete_fetch(&ticket, result);
                self.state.categories.clamp_selection();
                self.report_fetch(outcome);
            }
            Message::Currencies(ticket, result) => {
                let outcome = self.state.currencies.controller.complete_fetch(&ticket, result);
                self.state.currencies.clamp_selection();
                self.report_fetch(outcome);
            }
            Message::PaymentMethods(ticket, result) => {
                let outcome = self
                    .state
                    .payment_methods
                    .controller
                    .complete_fetch(&ticket, result);
                self.state.payment_methods.clamp_selection();
                self.report_fetch(outcome);
            }
            Message::Dashboard(result) => {
                self.state.dashboard.loading = false;
                match result {
                    Ok(transactions) => {
                        self.state.dashboard.transactions = transactions;
                        self.state.dashboard.error = None;
                        self.state.dashboard.rebuild(self.tz, self.config.palette());
                    }
                    Err(err) => {
                        tracing::error!("dashboard refresh failed: {err}");
                        self.state.dashboard.error = Some(user_message(&err));
                    }
                }
            }
            Message::Lookups(result) => match result {
                Ok(lookups) => self.state.lookups = lookups,
                Err(err) => tracing::error!("failed to load lookups: {err}"),
            },
            Message::Editable(result) => match result {
                Ok(record) => self.open_edit_form(record),
                Err(err) => self.state.toast(ToastLevel::Error, user_message(&err)),
            },
            Message::Saved(resource, result) => match result {
                Ok(()) => {
                    self.state.modal = None;
                    self.state.editing = None;
                    self.state.invalidate(resource);
                    self.refresh_dashboard();
                    self.refresh_lookups();
                    self.state.toast(ToastLevel::Success, "Saved");
                }
                Err(err) => self.form_failed(&err),
            },
            Message::Deleted(resource, id, result) => {
                let result = match resource {
                    Resource::Transactions => {
                        self.state.transactions.controller.complete_delete(id, result)
                    }
                    Resource::Categories => {
                        self.state.categories.controller.complete_delete(id, result)
                    }
                    Resource::Currencies => {
                        self.state.currencies.controller.complete_delete(id, result)
                    }
                    Resource::PaymentMethods => {
                        self.state.payment_methods.controller.complete_delete(id, result)
                    }
                };
                match result {
                    Ok(()) => {
                        self.refresh_dashboard();
                        self.refresh_lookups();
                        self.state.toast(ToastLevel::Success, "Deleted");
                    }
                    Err(err) => self.state.toast(ToastLevel::Error, user_message(&err)),
                }
            }
        }
    }

    fn report_fetch(&mut self, outcome: FetchOutcome<ClientError>) {
        if let FetchOutcome::Failed(err) = outcome {
            if matches!(err, ClientError::Unauthorized) {
                self.sign_out();
            }
            self.state.toast(ToastLevel::Error, user_message(&err));
        }
    }

    fn form_failed(&mut self, err: &ClientError) {
        if let Some(Modal::Form(form)) = self.state.modal.as_mut() {
            form.submitting = false;
        }
        self.state.toast(ToastLevel::Error, user_message(err));
    }

    fn on_signed_in(&mut self, response: AuthResponse) {
        let session = self.sessions.sign_in(response);
        self.state.user = Some(session.user.username.clone());
        self.state.screen = Screen::Shell;
        self.state.section = Section::Dashboard;
        self.state.invalidate_lists();
        self.refresh_dashboard();
        self.refresh_lookups();
    }

    fn sign_out(&mut self) {
        self.sessions.sign_out();
        let year = self.state.dashboard.year;
        self.state = AppState::new(
            &self.config.identifier,
            &self.config.base_url,
            self.config.page_size,
            year,
        );
    }

    fn handle_key(&mut self, key: KeyEvent) {
        let action = map_key(key, self.state.is_typing());
        if action == AppAction::Quit {
            self.should_quit = true;
            return;
        }

        if self.state.screen != Screen::Shell {
            self.handle_auth_key(action);
            return;
        }

        match self.state.modal.take() {
            Some(Modal::Form(form)) => self.handle_form_key(form, action),
            Some(Modal::ConfirmDelete(pending)) => self.handle_confirm_key(pending, action),
            Some(Modal::Filter) => self.handle_filter_key(action),
            None => self.handle_shell_key(action),
        }
    }

    fn handle_auth_key(&mut self, action: AppAction) {
        let form = &mut self.state.auth_form;
        match action {
            AppAction::NextField | AppAction::Down => form.next_field(),
            AppAction::PrevField | AppAction::Up => form.prev_field(),
            AppAction::Backspace => form.pop_char(),
            AppAction::Input(ch) => form.push_char(ch),
            AppAction::Cancel => {
                // Esc toggles between sign in and sign up.
                let (screen, form) = match self.state.screen {
                    Screen::SignIn => (Screen::SignUp, FormState::sign_up()),
                    _ => (Screen::SignIn, FormState::sign_in(&self.config.identifier)),
                };
                self.state.screen = screen;
                self.state.auth_form = form;
            }
            AppAction::Submit => self.submit_auth(),
            _ => {}
        }
    }

    fn submit_auth(&mut self) {
        let form = &mut self.state.auth_form;
        if form.submitting {
            return;
        }
        match form.target {
            FormTarget::SignIn => match form.sign_in_form().validate() {
                Ok(body) => {
                    form.errors = Default::default();
                    form.submitting = true;
                    let client = self.client.clone();
                    self.spawn(async move { Message::SignedIn(client.sign_in(&body).await) });
                }
                Err(err) => set_form_errors(form, err),
            },
            FormTarget::SignUp => match form.sign_up_form().validate() {
                Ok(body) => {
                    form.errors = Default::default();
                    form.submitting = true;
                    let client = self.client.clone();
                    self.spawn(async move { Message::Registered(client.register(&body).await) });
                }
                Err(err) => set_form_errors(form, err),
            },
            _ => {}
        }
    }

    fn handle_shell_key(&mut self, action: AppAction) {
        match action {
            AppAction::NextField => self.switch_section(self.state.section.next()),
            AppAction::Up => self.with_list(|view| view.select_prev()),
            AppAction::Down => self.with_list(|view| view.select_next()),
            AppAction::PrevPage => self.with_controller(|c| c.prev_page()),
            AppAction::NextPage => self.with_controller(|c| c.next_page()),
            AppAction::Submit => self.edit_selected(),
            AppAction::Input(ch) => self.handle_shell_char(ch),
            _ => {}
        }
    }

    fn handle_shell_char(&mut self, ch: char) {
        if let Some(section) = Section::from_digit(ch) {
            self.switch_section(section);
            return;
        }

        match (self.state.section, ch) {
            (_, 'q') => self.should_quit = true,
            (Section::Dashboard, 'r') => self.refresh_dashboard(),
            (Section::Dashboard, 'c') => {
                self.state
                    .dashboard
                    .cycle_currency(&self.state.lookups.currencies);
                self.state.dashboard.rebuild(self.tz, self.config.palette());
            }
            (Section::Dashboard, 't') => {
                self.state.dashboard.cycle_kind();
                self.state.dashboard.rebuild(self.tz, self.config.palette());
            }
            (Section::Dashboard, '[') => {
                self.state.dashboard.year -= 1;
                self.state.dashboard.rebuild(self.tz, self.config.palette());
            }
            (Section::Dashboard, ']') => {
                self.state.dashboard.year += 1;
                self.state.dashboard.rebuild(self.tz, self.config.palette());
            }
            (Section::Account, 'c') => {
                self.state.modal = Some(Modal::Form(FormState::change_password()));
            }
            (Section::Account, 'o') => {
                self.sign_out();
                self.state.toast(ToastLevel::Info, "Signed out");
            }
            (_, 'j') => self.with_list(|view| view.select_next()),
            (_, 'k') => self.with_list(|view| view.select_prev()),
            (_, 'n') => self.with_controller(|c| c.next_page()),
            (_, 'p') => self.with_controller(|c| c.prev_page()),
            (_, 'g') => self.with_controller(|c| c.first_page()),
            (_, 'G') => self.with_controller(|c| c.last_page()),
            (_, 'r') => self.with_controller(|c| c.invalidate()),
            (_, 'f') => self.with_controller(|c| c.cycle_filter_field()),
            (_, 'x') => self.with_controller(|c| c.clear_filter_value()),
            (_, '/') => {
                let has_field = self
                    .filter_field_selected()
                    .unwrap_or(false);
                if has_field {
                    self.state.modal = Some(Modal::Filter);
                } else if self.state.section.resource().is_some() {
                    self.state
                        .toast(ToastLevel::Info, "Press f to choose a filter field first");
                }
            }
            (_, 'a') => self.open_new_form(),
            (_, 'e') => self.edit_selected(),
            (_, 'd') => self.request_delete(),
            _ => {}
        }
    }

    fn handle_filter_key(&mut self, action: AppAction) {
        match action {
            AppAction::Cancel | AppAction::Submit => {}
            AppAction::Backspace => {
                self.with_controller(|c| {
                    let mut value = c.filter().value.clone();
                    value.pop();
                    if value.is_empty() {
                        c.clear_filter_value();
                    } else {
                        c.set_filter_value(value);
                    }
                });
                self.state.modal = Some(Modal::Filter);
            }
            AppAction::Input(ch) => {
                self.with_controller(|c| {
                    let value = format!("{}{ch}", c.filter().value);
                    c.set_filter_value(value);
                });
                self.state.modal = Some(Modal::Filter);
            }
            _ => self.state.modal = Some(Modal::Filter),
        }
    }

    fn handle_confirm_key(&mut self, pending: PendingDelete, action: AppAction) {
        match action {
            AppAction::Input('y') | AppAction::Submit => self.confirm_delete(pending),
            AppAction::Input('n') | AppAction::Cancel => {
                self.with_controller(|c| c.cancel_delete());
            }
            _ => self.state.modal = Some(Modal::ConfirmDelete(pending)),
        }
    }

    fn handle_form_key(&mut self, mut form: FormState, action: AppAction) {
        match action {
            AppAction::Cancel => {
                self.state.editing = None;
                return;
            }
            AppAction::NextField | AppAction::Down => form.next_field(),
            AppAction::PrevField | AppAction::Up => form.prev_field(),
            AppAction::Left => form.cycle_choice(-1),
            AppAction::Right => form.cycle_choice(1),
            AppAction::Backspace => form.pop_char(),
            AppAction::Input(ch) => form.push_char(ch),
            AppAction::Submit => self.submit_form(&mut form),
            _ => {}
        }
        self.state.modal = Some(Modal::Form(form));
    }

    fn switch_section(&mut self, section: Section) {
        self.state.section = section;
        if section == Section::Dashboard && self.state.dashboard.dashboard.is_none() {
            self.refresh_dashboard();
        }
    }

    fn filter_field_selected(&self) -> Option<bool> {
        Some(match self.state.section {
            Section::Transactions => self.state.transactions.controller.filter().field.is_some(),
            Section::Categories => self.state.categories.controller.filter().field.is_some(),
            Section::Currencies => self.state.currencies.controller.filter().field.is_some(),
            Section::PaymentMethods => {
                self.state.payment_methods.controller.filter().field.is_some()
            }
            Section::Dashboard | Section::Account => return None,
        })
    }

    /// Runs `f` on the controller of the visible list, if any.
    fn with_controller(&mut self, f: impl FnOnce(&mut dyn ControllerHandle)) {
        match self.state.section {
            Section::Transactions => f(&mut self.state.transactions.controller),
            Section::Categories => f(&mut self.state.categories.controller),
            Section::Currencies => f(&mut self.state.currencies.controller),
            Section::PaymentMethods => f(&mut self.state.payment_methods.controller),
            Section::Dashboard | Section::Account => {}
        }
    }

    fn with_list(&mut self, f: impl FnOnce(&mut dyn SelectHandle)) {
        match self.state.section {
            Section::Transactions => f(&mut self.state.transactions),
            Section::Categories => f(&mut self.state.categories),
            Section::Currencies => f(&mut self.state.currencies),
            Section::PaymentMethods => f(&mut self.state.payment_methods),
            Section::Dashboard | Section::Account => {}
        }
    }

    fn open_new_form(&mut self) {
        let form = match self.state.section {
            Section::Transactions => FormState::transaction(None, &self.state.lookups),
            Section::Categories => FormState::category(None),
            Section::Currencies => FormState::currency(None),
            Section::PaymentMethods => FormState::payment_method(None),
            Section::Dashboard | Section::Account => return,
        };
        self.state.editing = None;
        self.state.modal = Some(Modal::Form(form));
    }

    /// Fetches the highlighted record with its relations, then opens the form.
    fn edit_selected(&mut self) {
        let Some(authed) = self.authed() else {
            return;
        };
        let selected = match self.state.section {
            Section::Transactions => self.state.transactions.selected_item().map(|r| r.id),
            Section::Categories => self.state.categories.selected_item().map(|r| r.id),
            Section::Currencies => self.state.currencies.selected_item().map(|r| r.id),
            Section::PaymentMethods => self.state.payment_methods.selected_item().map(|r| r.id),
            Section::Dashboard | Section::Account => None,
        };
        let (Some(id), Some(resource)) = (selected, self.state.section.resource()) else {
            return;
        };
        self.spawn(async move {
            let result = match resource {
                Resource::Transactions => authed.get(resource, id).await.map(Editable::Transaction),
                Resource::Categories => authed.get(resource, id).await.map(Editable::Category),
                Resource::Currencies => authed.get(resource, id).await.map(Editable::Currency),
                Resource::PaymentMethods => {
                    authed.get(resource, id).await.map(Editable::PaymentMethod)
                }
            };
            Message::Editable(result)
        });
    }

    fn open_edit_form(&mut self, record: Editable) {
        let form = match &record {
            Editable::Transaction(tx) => FormState::transaction(Some(tx), &self.state.lookups),
            Editable::Category(category) => FormState::category(Some(category)),
            Editable::Currency(currency) => FormState::currency(Some(currency)),
            Editable::PaymentMethod(method) => FormState::payment_method(Some(method)),
        };
        self.state.editing = match record {
            Editable::Transaction(tx) => Some(tx),
            _ => None,
        };
        self.state.modal = Some(Modal::Form(form));
    }

    fn submit_form(&mut self, form: &mut FormState) {
        if form.submitting {
            return;
        }
        let (Some(user_id), Some(session)) = (
            self.user_id(),
            self.sessions.current().ok().cloned(),
        ) else {
            return;
        };
        let client = self.client.clone();

        let task: std::result::Result<_, EngineError> = match form.target {
            FormTarget::ChangePassword => form.change_password_form().validate().map(|body| {
                let task: BoxedTask = Box::pin(async move {
                    Message::PasswordChanged(client.change_password(&session, &body).await)
                });
                task
            }),
            FormTarget::Category(id) => form
                .category_form()
                .validate(user_id)
                .map(|body| save(client, session, Resource::Categories, id, body)),
            FormTarget::Currency(id) => form
                .currency_form()
                .validate(user_id)
                .map(|body| save(client, session, Resource::Currencies, id, body)),
            FormTarget::PaymentMethod(id) => form
                .payment_method_form()
                .validate(user_id)
                .map(|body| save(client, session, Resource::PaymentMethods, id, body)),
            FormTarget::Transaction(id) => form
                .transaction_form(self.state.editing.as_ref())
                .and_then(|(tx, upload)| {
                    tx.validate(user_id, Utc::now())
                        .map(|body| save_transaction(client, session, id, body, upload))
                }),
            FormTarget::SignIn | FormTarget::SignUp => return,
        };

        match task {
            Ok(task) => {
                form.errors = Default::default();
                form.submitting = true;
                self.spawn(task);
            }
            Err(err) => set_form_errors(form, err),
        }
    }

    fn request_delete(&mut self) {
        let pending = match self.state.section {
            Section::Transactions => self.state.transactions.selected_item().map(|tx| PendingDelete {
                resource: Resource::Transactions,
                id: tx.id,
                label: tx
                    .description
                    .clone()
                    .unwrap_or_else(|| format!("transaction #{}", tx.id)),
            }),
            Section::Categories => named_delete(&self.state.categories, Resource::Categories, |c| &c.name, |c| c.id),
            Section::Currencies => named_delete(&self.state.currencies, Resource::Currencies, |c| &c.name, |c| c.id),
            Section::PaymentMethods => named_delete(
                &self.state.payment_methods,
                Resource::PaymentMethods,
                |m| &m.name,
                |m| m.id,
            ),
            Section::Dashboard | Section::Account => None,
        };
        if let Some(pending) = pending {
            let id = pending.id;
            self.with_controller(move |c| c.request_delete(id));
            self.state.modal = Some(Modal::ConfirmDelete(pending));
        }
    }

    fn confirm_delete(&mut self, pending: PendingDelete) {
        let Some(authed) = self.authed() else {
            return;
        };
        let mut confirmed = None;
        self.with_controller(|c| confirmed = c.confirm_delete());
        let Some(id) = confirmed else {
            return;
        };
        let resource = pending.resource;
        self.spawn(async move {
            let result = engine::DeleteSink::delete(&authed, resource, id).await;
            Message::Deleted(resource, id, result)
        });
    }
}

type BoxedTask = std::pin::Pin<Box<dyn Future<Output = Message> + Send>>;

fn save<B>(client: Client, session: Session, resource: Resource, id: Option<u64>, body: B) -> BoxedTask
where
    B: serde::Serialize + Send + Sync + 'static,
{
    Box::pin(async move {
        let result = match id {
            Some(id) => client.update(&session, resource, id, &body).await,
            None => client.create(&session, resource, &body).await.map(|_| ()),
        };
        Message::Saved(resource, result)
    })
}

fn save_transaction(
    client: Client,
    session: Session,
    id: Option<u64>,
    mut body: api_types::transaction::TransactionData,
    upload: Option<PathBuf>,
) -> BoxedTask {
    Box::pin(async move {
        if let Some(path) = upload {
            match client.upload(&session, &path).await {
                Ok(UploadedFile { id, .. }) => body.receipt = Some(id),
                Err(err) => return Message::Saved(Resource::Transactions, Err(err)),
            }
        }
        let result = match id {
            Some(id) => {
                client
                    .update(&session, Resource::Transactions, id, &body)
                    .await
            }
            None => client
                .create(&session, Resource::Transactions, &body)
                .await
                .map(|_| ()),
        };
        Message::Saved(Resource::Transactions, result)
    })
}

fn named_delete<T>(
    view: &ListView<T>,
    resource: Resource,
    name: impl Fn(&T) -> &String,
    id: impl Fn(&T) -> u64,
) -> Option<PendingDelete> {
    view.selected_item().map(|record| PendingDelete {
        resource,
        id: id(record),
        label: name(record).clone(),
    })
}

fn set_form_errors(form: &mut FormState, err: EngineError) {
    match err {
        EngineError::Validation(errors) => form.errors = errors,
        other => tracing::error!("unexpected form error: {other}"),
    }
}

/// Begins a fetch on one of the lists and spawns the request.
fn spawn_list<T, F, M>(app: &mut App, user_id: u64, authed: Authed, view: F, wrap: M)
where
    T: WireRecord,
    F: FnOnce(&mut AppState) -> &mut ListView<T>,
    M: FnOnce(FetchTicket, ClientResult<ListPage<T>>) -> Message + Send + 'static,
{
    let controller = &mut view(&mut app.state).controller;
    if !controller.needs_fetch() {
        return;
    }
    let Some(ticket) = controller.begin_fetch(user_id) else {
        return;
    };
    app.spawn(async move {
        let result = ListSource::<T>::list(&authed, ticket.resource, &ticket.query).await;
        wrap(ticket, result)
    });
}

/// Type-erased view of a list controller for the key handlers.
trait ControllerHandle {
    fn filter(&self) -> &Filter;
    fn set_filter_value(&mut self, value: String);
    fn clear_filter_value(&mut self);
    fn cycle_filter_field(&mut self);
    fn next_page(&mut self);
    fn prev_page(&mut self);
    fn first_page(&mut self);
    fn last_page(&mut self);
    fn invalidate(&mut self);
    fn request_delete(&mut self, id: u64);
    fn cancel_delete(&mut self);
    fn confirm_delete(&mut self) -> Option<u64>;
}

impl<T> ControllerHandle for ListController<T> {
    fn filter(&self) -> &Filter {
        ListController::filter(self)
    }
    fn set_filter_value(&mut self, value: String) {
        ListController::set_filter_value(self, value);
    }
    fn clear_filter_value(&mut self) {
        ListController::clear_filter_value(self);
    }
    fn cycle_filter_field(&mut self) {
        ListController::cycle_filter_field(self);
    }
    fn next_page(&mut self) {
        ListController::next_page(self);
    }
    fn prev_page(&mut self) {
        ListController::prev_page(self);
    }
    fn first_page(&mut self) {
        ListController::first_page(self);
    }
    fn last_page(&mut self) {
        ListController::last_page(self);
    }
    fn invalidate(&mut self) {
        ListController::invalidate(self);
    }
    fn request_delete(&mut self, id: u64) {
        ListController::request_delete(self, id);
    }
    fn cancel_delete(&mut self) {
        ListController::cancel_delete(self);
    }
    fn confirm_delete(&mut self) -> Option<u64> {
        ListController::confirm_delete(self)
    }
}

trait SelectHandle {
    fn select_next(&mut self);
    fn select_prev(&mut self);
}

impl<T> SelectHandle for ListView<T> {
    fn select_next(&mut self) {
        ListView::select_next(self);
    }
    fn select_prev(&mut self) {
        ListView::select_prev(self);
    }
}

#[cfg(test)]
mod tests {
    use engine::{FilterField, Page};

    use super::*;

    fn app() -> App {
        let mut app = App::new(AppConfig::default()).unwrap();
        app.state.screen = Screen::Shell;
        app
    }

    fn page<T>(items: Vec<T>) -> ClientResult<ListPage<T>> {
        Ok(ListPage {
            items,
            page: Page {
                page: 1,
                page_size: 10,
                page_count: 1,
                total: 1,
            },
        })
    }

    fn category(id: u64, name: &str) -> Category {
        Category {
            id,
            name: name.to_string(),
            kind: api_types::category::CategoryType::Expense,
        }
    }

    #[test]
    fn stale_list_response_is_ignored() {
        let mut app = app();
        let controller = &mut app.state.categories.controller;
        let old = controller.begin_fetch(1).unwrap();
        controller.set_filter_field(Some(FilterField::Name)).unwrap();
        controller.set_filter_value("re");
        let new = controller.begin_fetch(1).unwrap();

        app.apply(Message::Categories(old, page(vec![category(1, "Food")])));
        assert!(app.state.categories.controller.items().is_empty());

        app.apply(Message::Categories(new, page(vec![category(2, "Rent")])));
        assert_eq!(app.state.categories.controller.items()[0].name, "Rent");
    }

    #[tokio::test]
    async fn filter_typed_during_a_fetch_supersedes_it() {
        let mut app = app();
        app.sessions.sign_in(AuthResponse {
            jwt: "token".to_string(),
            user: api_types::auth::User {
                id: 3,
                username: "ada".to_string(),
                email: None,
            },
        });
        app.state.section = Section::Categories;

        app.ensure_fetch();
        let old = FetchTicket {
            seq: 1,
            resource: Resource::Categories,
            query: app.state.categories.controller.query(3),
        };
        assert!(app.state.categories.controller.is_fetching());
        assert!(!app.state.categories.controller.needs_fetch());

        app.handle_shell_char('f');
        app.handle_shell_char('/');
        app.state.modal.take();
        app.handle_filter_key(AppAction::Input('r'));
        assert!(app.state.categories.controller.needs_fetch());

        app.ensure_fetch();
        assert!(!app.state.categories.controller.needs_fetch());
        let newer = FetchTicket {
            seq: 2,
            resource: Resource::Categories,
            query: app.state.categories.controller.query(3),
        };
        assert_eq!(newer.query.get("filters[name][$containsi]"), Some("r"));

        app.apply(Message::Categories(old, page(vec![category(1, "Food")])));
        assert!(app.state.categories.controller.items().is_empty());
        assert!(app.state.toast.is_none());

        app.apply(Message::Categories(newer, page(vec![category(2, "Rent")])));
        assert_eq!(app.state.categories.controller.items()[0].name, "Rent");
        assert_eq!(app.state.categories.controller.filter().value, "r");
    }

    #[test]
    fn delete_is_cancelled_without_confirmation() {
        let mut app = app();
        app.state.section = Section::Categories;
        let ticket = app.state.categories.controller.begin_fetch(1).unwrap();
        app.apply(Message::Categories(ticket, page(vec![category(4, "Food")])));

        app.handle_shell_char('d');
        let Some(Modal::ConfirmDelete(pending)) = app.state.modal.take() else {
            panic!("expected a confirmation prompt");
        };
        assert_eq!(pending.id, 4);
        assert_eq!(app.state.categories.controller.pending_delete(), Some(4));

        app.handle_confirm_key(pending, AppAction::Input('n'));
        assert!(app.state.modal.is_none());
        assert_eq!(app.state.categories.controller.pending_delete(), None);
    }

    #[test]
    fn failed_fetch_raises_an_error_toast() {
        let mut app = app();
        let ticket = app.state.currencies.controller.begin_fetch(1).unwrap();
        app.apply(Message::Currencies(
            ticket,
            Err(ClientError::Server("Internal Server Error".into())),
        ));
        let toast = app.state.toast.as_ref().unwrap();
        assert_eq!(toast.level, ToastLevel::Error);
        assert_eq!(toast.message, "Internal Server Error");
    }

    #[test]
    fn escape_switches_between_sign_in_and_sign_up() {
        let mut app = App::new(AppConfig::default()).unwrap();
        app.handle_auth_key(AppAction::Cancel);
        assert_eq!(app.state.screen, Screen::SignUp);
        assert_eq!(app.state.auth_form.target, FormTarget::SignUp);
        app.handle_auth_key(AppAction::Cancel);
        assert_eq!(app.state.screen, Screen::SignIn);
    }

    #[test]
    fn invalid_sign_in_shows_field_errors() {
        let mut app = App::new(AppConfig::default()).unwrap();
        app.handle_auth_key(AppAction::Submit);
        assert!(!app.state.auth_form.submitting);
        assert!(app.state.auth_form.error_for("identifier").is_some());
    }
}

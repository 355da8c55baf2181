use engine::{
    FetchOutcome, FetchStatus, FilterField, ListController, ListPage, Page, Resource,
};

mod common;
use common::FakeSource;

const USER: u64 = 1;

async fn loaded(source: &FakeSource) -> ListController<u64> {
    let mut controller = ListController::new(Resource::Transactions, 10);
    assert_eq!(controller.fetch_page(source, USER).await, FetchOutcome::Applied);
    controller
}

#[tokio::test]
async fn changing_the_filter_field_goes_back_to_page_one() {
    let source = FakeSource::new((1..=45).collect());
    let mut controller = loaded(&source).await;

    controller.set_page(3);
    controller.fetch_page(&source, USER).await;
    assert_eq!(controller.page().page, 3);

    controller
        .set_filter_field(Some(FilterField::Description))
        .unwrap();
    assert_eq!(controller.page().page, 1);
    assert_eq!(controller.filter().value, "");
    assert!(controller.needs_fetch());
}

#[tokio::test]
async fn filter_and_page_are_both_sent() {
    let source = FakeSource::new((1..=45).collect());
    let mut controller = loaded(&source).await;

    controller.set_filter_field(Some(FilterField::Amount)).unwrap();
    controller.set_filter_value("10");
    controller.set_page(2);
    controller.fetch_page(&source, USER).await;

    let query = source.last_query().unwrap();
    assert_eq!(query.get("pagination[page]"), Some("2"));
    assert_eq!(query.get("filters[amount][$containsi]"), Some("10"));
    assert_eq!(query.get("filters[user][id][$eq]"), Some("1"));
    assert_eq!(query.get("sort[0]"), Some("id:desc"));
}

#[tokio::test]
async fn server_error_keeps_the_previous_page() {
    let source = FakeSource::new((1..=45).collect());
    let mut controller = loaded(&source).await;
    let before: Vec<u64> = controller.items().to_vec();

    source.fail_next(true);
    controller.set_filter_field(Some(FilterField::Amount)).unwrap();
    controller.set_filter_value("10");
    controller.set_page(2);
    let outcome = controller.fetch_page(&source, USER).await;

    assert!(matches!(outcome, FetchOutcome::Failed(_)));
    assert_eq!(controller.items(), before.as_slice());
    assert_eq!(controller.page().page, 2);
    assert_eq!(controller.filter().field, Some(FilterField::Amount));
    assert_eq!(controller.filter().value, "10");
    assert_eq!(
        controller.status(),
        &FetchStatus::Failed("Internal Server Error".to_string())
    );
    assert!(!controller.needs_fetch());
}

#[tokio::test]
async fn delete_waits_for_confirmation() {
    let source = FakeSource::new((1..=5).collect());
    let mut controller = loaded(&source).await;

    controller.request_delete(4);
    assert!(source.deleted().is_empty());

    controller.cancel_delete();
    assert!(controller.delete_confirmed(&source).await.is_none());
    assert!(source.deleted().is_empty());

    controller.request_delete(4);
    let result = controller.delete_confirmed(&source).await;
    assert_eq!(result, Some(Ok(())));
    assert_eq!(source.deleted(), vec![(Resource::Transactions, 4)]);
    assert!(controller.needs_fetch());
}

#[test]
fn only_the_latest_response_is_applied() {
    let mut controller = ListController::<u64>::new(Resource::Categories, 10);
    let first = controller.begin_fetch(USER).unwrap();
    controller.set_page(1);
    controller.set_filter_field(Some(FilterField::Name)).unwrap();
    controller.set_filter_value("fo");
    let second = controller.begin_fetch(USER).unwrap();
    assert!(second.seq > first.seq);

    let page = |items: Vec<u64>| {
        Ok::<_, String>(ListPage {
            items,
            page: Page {
                page: 1,
                page_size: 10,
                page_count: 1,
                total: 1,
            },
        })
    };

    assert_eq!(controller.complete_fetch(&second, page(vec![2])), FetchOutcome::Applied);
    assert_eq!(controller.complete_fetch(&first, page(vec![1])), FetchOutcome::Stale);
    assert_eq!(controller.items(), &[2]);
}

#[tokio::test]
async fn same_query_is_not_requested_twice() {
    let source = FakeSource::new((1..=5).collect());
    let mut controller = ListController::<u64>::new(Resource::Transactions, 10);

    let ticket = controller.begin_fetch(USER).unwrap();
    assert_eq!(controller.fetch_page(&source, USER).await, FetchOutcome::Duplicate);
    assert_eq!(source.calls(), 0);

    let result = engine::ListSource::list(&source, ticket.resource, &ticket.query).await;
    assert_eq!(controller.complete_fetch(&ticket, result), FetchOutcome::Applied);
    assert_eq!(controller.items().len(), 5);
}

#[tokio::test]
async fn typing_during_a_fetch_issues_a_new_request() {
    let source = FakeSource::new((1..=45).collect());
    let mut controller = loaded(&source).await;
    controller
        .set_filter_field(Some(FilterField::Description))
        .unwrap();

    let old = controller.begin_fetch(USER).unwrap();
    assert!(!controller.needs_fetch());
    controller.set_filter_value("rent");
    assert!(controller.needs_fetch());

    let newer = controller.begin_fetch(USER).unwrap();
    assert_eq!(
        newer.query.get("filters[description][$containsi]"),
        Some("rent")
    );

    let old_result = engine::ListSource::list(&source, old.resource, &old.query).await;
    assert_eq!(controller.complete_fetch(&old, old_result), FetchOutcome::Stale);
    assert!(controller.is_fetching());

    let result = engine::ListSource::list(&source, newer.resource, &newer.query).await;
    assert_eq!(controller.complete_fetch(&newer, result), FetchOutcome::Applied);
    assert_eq!(controller.filter().value, "rent");
    assert!(!controller.needs_fetch());
}

#[tokio::test]
async fn next_page_during_a_refresh_is_not_lost() {
    let source = FakeSource::new((1..=45).collect());
    let mut controller = loaded(&source).await;

    controller.invalidate();
    let refresh = controller.begin_fetch(USER).unwrap();
    controller.next_page();

    let result = engine::ListSource::list(&source, refresh.resource, &refresh.query).await;
    assert_eq!(controller.complete_fetch(&refresh, result), FetchOutcome::Stale);
    assert_eq!(controller.page().page, 2);
    assert!(controller.needs_fetch());

    assert_eq!(controller.fetch_page(&source, USER).await, FetchOutcome::Applied);
    assert_eq!(controller.page().page, 2);
    assert_eq!(source.last_query().unwrap().get("pagination[page]"), Some("2"));
}

//! Behaviour tests for the recommendation service.

mod support;

use std::cell::RefCell;

use hotspot_core::{Recommendation, TravelMode, UserQuery};
use hotspot_scorer::Recommender;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use support::{corridor, corridor_point};

#[fixture]
fn recommender() -> RefCell<Option<Recommender>> {
    RefCell::new(None)
}

#[fixture]
fn results() -> RefCell<Vec<Recommendation>> {
    RefCell::new(Vec::new())
}

#[given("a walking corridor with popularity 80, 85, 90 and 60")]
fn given_corridor(#[from(recommender)] recommender: &RefCell<Option<Recommender>>) {
    recommender.replace(Some(corridor(&[80.0, 85.0, 90.0, 60.0])));
}

fn ask(
    recommender: &RefCell<Option<Recommender>>,
    results: &RefCell<Vec<Recommendation>>,
    query: &UserQuery,
) {
    let recommender = recommender.borrow();
    let recommender = recommender.as_ref().expect("corridor built");
    results.replace(recommender.recommend(query).expect("valid query"));
}

#[when("I ask for walking recommendations from the first node within 20 minutes")]
fn when_twenty(
    #[from(recommender)] recommender: &RefCell<Option<Recommender>>,
    #[from(results)] results: &RefCell<Vec<Recommendation>>,
) {
    let query = UserQuery::new(corridor_point(0), TravelMode::Walk, 20.0);
    ask(recommender, results, &query);
}

#[when("I ask for popularity-only walking recommendations from the first node within 20 minutes")]
fn when_popularity_only(
    #[from(recommender)] recommender: &RefCell<Option<Recommender>>,
    #[from(results)] results: &RefCell<Vec<Recommendation>>,
) {
    let query = UserQuery::new(corridor_point(0), TravelMode::Walk, 20.0).with_weights(1.0, 0.0);
    ask(recommender, results, &query);
}

#[when("I ask for walking recommendations from the first node within 7 minutes")]
fn when_seven(
    #[from(recommender)] recommender: &RefCell<Option<Recommender>>,
    #[from(results)] results: &RefCell<Vec<Recommendation>>,
) {
    let query = UserQuery::new(corridor_point(0), TravelMode::Walk, 7.0);
    ask(recommender, results, &query);
}

#[then("the first recommendation is hotspot 0")]
fn then_first_is_origin(#[from(results)] results: &RefCell<Vec<Recommendation>>) {
    let results = results.borrow();
    let first = results.first().expect("at least one recommendation");
    assert_eq!(first.hotspot_id.0, 0);
    assert_eq!(first.rank, 1);
}

#[then("its accessibility score is 100")]
fn then_full_access(#[from(results)] results: &RefCell<Vec<Recommendation>>) {
    let results = results.borrow();
    let first = results.first().expect("at least one recommendation");
    assert_eq!(first.travel_time_minutes, 0.0);
    assert_eq!(first.accessibility_score, 100.0);
}

#[then("the hotspots are ranked 2, 1, 0, 3")]
fn then_popularity_order(#[from(results)] results: &RefCell<Vec<Recommendation>>) {
    let ids: Vec<u32> = results.borrow().iter().map(|r| r.hotspot_id.0).collect();
    assert_eq!(ids, vec![2, 1, 0, 3]);
}

#[then("2 recommendations are returned")]
fn then_two(#[from(results)] results: &RefCell<Vec<Recommendation>>) {
    assert_eq!(results.borrow().len(), 2);
}

#[scenario(path = "tests/features/recommendation.feature", index = 0)]
fn origin_hotspot_ranks_first(
    recommender: RefCell<Option<Recommender>>,
    results: RefCell<Vec<Recommendation>>,
) {
    let _ = (recommender, results);
}

#[scenario(path = "tests/features/recommendation.feature", index = 1)]
fn alpha_one_orders_by_popularity(
    recommender: RefCell<Option<Recommender>>,
    results: RefCell<Vec<Recommendation>>,
) {
    let _ = (recommender, results);
}

#[scenario(path = "tests/features/recommendation.feature", index = 2)]
fn budget_excludes_far_hotspots(
    recommender: RefCell<Option<Recommender>>,
    results: RefCell<Vec<Recommendation>>,
) {
    let _ = (recommender, results);
}

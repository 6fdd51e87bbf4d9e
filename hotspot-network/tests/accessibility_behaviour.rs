//! Behaviour tests for cutoff-bounded accessibility scoring.

use std::cell::RefCell;

use geo::Coord;
use hotspot_core::{HotspotId, TravelMode};
use hotspot_network::{
    Accessibility, AccessibilityScorer, EdgeDefinition, NetworkDefinition, NodeDefinition,
    TransportGraph,
};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

const CORNERS: [(f64, f64); 4] = [
    (-73.990, 40.750),
    (-73.9853, 40.750),
    (-73.9853, 40.7536),
    (-73.990, 40.7536),
];
const ISLAND: (f64, f64) = (-73.90, 40.80);

#[fixture]
fn network() -> RefCell<NetworkDefinition> {
    RefCell::new(NetworkDefinition::default())
}

#[fixture]
fn centroids() -> RefCell<Vec<(HotspotId, Coord<f64>)>> {
    RefCell::new(Vec::new())
}

#[fixture]
fn scored() -> RefCell<Vec<Accessibility>> {
    RefCell::new(Vec::new())
}

#[given("a walking network of four corners 400 metres apart")]
fn given_corners(#[from(network)] network: &RefCell<NetworkDefinition>) {
    let mut definition = network.borrow_mut();
    definition.nodes = CORNERS
        .iter()
        .zip(1_u64..)
        .map(|(&(lon, lat), id)| NodeDefinition { id, lon, lat })
        .collect();
    definition.edges = [(1, 2), (2, 3), (3, 4)]
        .into_iter()
        .map(|(from, to)| EdgeDefinition {
            from,
            to,
            length_m: 400.0,
            bidirectional: true,
        })
        .collect();
}

#[given("hotspots snapped to every corner")]
fn given_hotspots(#[from(centroids)] centroids: &RefCell<Vec<(HotspotId, Coord<f64>)>>) {
    centroids.borrow_mut().extend(
        CORNERS
            .iter()
            .zip(0_u32..)
            .map(|(&(x, y), id)| (HotspotId(id), Coord { x, y })),
    );
}

#[given("an island node far from the corners")]
fn given_island(
    #[from(network)] network: &RefCell<NetworkDefinition>,
    #[from(centroids)] centroids: &RefCell<Vec<(HotspotId, Coord<f64>)>>,
) {
    network.borrow_mut().nodes.push(NodeDefinition {
        id: 99,
        lon: ISLAND.0,
        lat: ISLAND.1,
    });
    centroids.borrow_mut().push((
        HotspotId(4),
        Coord {
            x: ISLAND.0,
            y: ISLAND.1,
        },
    ));
}

fn score_from_first_corner(
    network: &RefCell<NetworkDefinition>,
    centroids: &RefCell<Vec<(HotspotId, Coord<f64>)>>,
    scored: &RefCell<Vec<Accessibility>>,
    budget: f64,
) {
    let graph = TransportGraph::from_definition(&network.borrow(), TravelMode::Walk, 4.8)
        .expect("valid network");
    let scorer = AccessibilityScorer::new(&graph);
    let targets = scorer.snap(centroids.borrow().iter().copied());
    let (lon, lat) = CORNERS[0];
    let result = scorer
        .score(Coord { x: lon, y: lat }, budget, &targets)
        .expect("valid query");
    scored.replace(result);
}

#[when("I score accessibility from the first corner with a 20 minute budget")]
fn when_twenty(
    #[from(network)] network: &RefCell<NetworkDefinition>,
    #[from(centroids)] centroids: &RefCell<Vec<(HotspotId, Coord<f64>)>>,
    #[from(scored)] scored: &RefCell<Vec<Accessibility>>,
) {
    score_from_first_corner(network, centroids, scored, 20.0);
}

#[when("I score accessibility from the first corner with a 7 minute budget")]
fn when_seven(
    #[from(network)] network: &RefCell<NetworkDefinition>,
    #[from(centroids)] centroids: &RefCell<Vec<(HotspotId, Coord<f64>)>>,
    #[from(scored)] scored: &RefCell<Vec<Accessibility>>,
) {
    score_from_first_corner(network, centroids, scored, 7.0);
}

#[when("I score accessibility from the first corner with a 60 minute budget")]
fn when_sixty(
    #[from(network)] network: &RefCell<NetworkDefinition>,
    #[from(centroids)] centroids: &RefCell<Vec<(HotspotId, Coord<f64>)>>,
    #[from(scored)] scored: &RefCell<Vec<Accessibility>>,
) {
    score_from_first_corner(network, centroids, scored, 60.0);
}

#[then("the hotspot at the first corner scores 100")]
fn then_origin_full(#[from(scored)] scored: &RefCell<Vec<Accessibility>>) {
    let scored = scored.borrow();
    let origin = scored
        .iter()
        .find(|a| a.hotspot_id == HotspotId(0))
        .expect("origin hotspot reachable");
    assert_eq!(origin.travel_time_minutes, 0.0);
    assert_eq!(origin.score, 100.0);
}

#[then("2 hotspots are reachable")]
fn then_two(#[from(scored)] scored: &RefCell<Vec<Accessibility>>) {
    assert_eq!(scored.borrow().len(), 2);
}

#[then("4 hotspots are reachable")]
fn then_four(#[from(scored)] scored: &RefCell<Vec<Accessibility>>) {
    let scored = scored.borrow();
    assert_eq!(scored.len(), 4);
    assert!(scored.iter().all(|a| a.hotspot_id != HotspotId(4)));
}

#[scenario(path = "tests/features/accessibility.feature", index = 0)]
fn origin_hotspot_fully_accessible(
    network: RefCell<NetworkDefinition>,
    centroids: RefCell<Vec<(HotspotId, Coord<f64>)>>,
    scored: RefCell<Vec<Accessibility>>,
) {
    let _ = (network, centroids, scored);
}

#[scenario(path = "tests/features/accessibility.feature", index = 1)]
fn hotspots_beyond_budget_excluded(
    network: RefCell<NetworkDefinition>,
    centroids: RefCell<Vec<(HotspotId, Coord<f64>)>>,
    scored: RefCell<Vec<Accessibility>>,
) {
    let _ = (network, centroids, scored);
}

#[scenario(path = "tests/features/accessibility.feature", index = 2)]
fn disconnected_hotspots_excluded(
    network: RefCell<NetworkDefinition>,
    centroids: RefCell<Vec<(HotspotId, Coord<f64>)>>,
    scored: RefCell<Vec<Accessibility>>,
) {
    let _ = (network, centroids, scored);
}

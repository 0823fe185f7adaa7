mod common;

use demand_forecast::features::{label_examples, LabeledExample};
use demand_forecast::split::{ChronologicalSplit, EntityDisjointSplit, Partitions};
use demand_forecast::{DataLoader, SplitConfig, SplitStrategy};
use rstest::rstest;
use std::collections::BTreeSet;

fn examples() -> Vec<LabeledExample> {
    let csv = common::training_csv(12, 20);
    let df = DataLoader::read_upload(csv.as_bytes()).unwrap();
    label_examples(&DataLoader::from_dataframe(&df).unwrap())
}

fn keys(examples: &[LabeledExample]) -> BTreeSet<(i64, i64, String)> {
    examples
        .iter()
        .map(|e| (e.entity.store_id, e.entity.product_id, e.dt.to_string()))
        .collect()
}

fn products(examples: &[LabeledExample]) -> BTreeSet<i64> {
    examples.iter().map(|e| e.entity.product_id).collect()
}

#[rstest]
#[case(SplitConfig::EntityDisjoint(EntityDisjointSplit::default()))]
#[case(SplitConfig::EntityDisjoint(EntityDisjointSplit { train_ratio: 0.5, val_ratio: 0.5, seed: 7 }))]
#[case(SplitConfig::Chronological(ChronologicalSplit::default()))]
#[case(SplitConfig::Chronological(ChronologicalSplit { train_percentile: 60.0, val_percentile: Some(80.0) }))]
fn test_partitions_are_disjoint_and_cover_input(#[case] config: SplitConfig) {
    let all = examples();
    let expected = keys(&all);
    let partitions = config.build().unwrap().split(all).unwrap();

    let train = keys(&partitions.train);
    let validation = keys(&partitions.validation);
    let test = keys(&partitions.test);

    assert!(train.is_disjoint(&validation));
    assert!(train.is_disjoint(&test));
    assert!(validation.is_disjoint(&test));
    assert_eq!(train.len() + validation.len() + test.len(), expected.len());
    assert!(!partitions.train.is_empty());
}

#[test]
fn test_entity_disjoint_never_shares_products() {
    let partitions = EntityDisjointSplit::default().split(examples()).unwrap();

    let train = products(&partitions.train);
    let validation = products(&partitions.validation);
    let test = products(&partitions.test);
    assert!(train.is_disjoint(&validation));
    assert!(train.is_disjoint(&test));
    assert!(validation.is_disjoint(&test));

    // floor(0.7 * 12) = 8 and floor(0.15 * 12) = 1
    assert_eq!(train.len(), 8);
    assert_eq!(validation.len(), 1);
    assert_eq!(test.len(), 3);
}

#[rstest]
#[case(7, 42)]
#[case(12, 3)]
fn test_entity_disjoint_without_test_share(#[case] n_products: i64, #[case] seed: u64) {
    let csv = common::training_csv(n_products, 5);
    let df = DataLoader::read_upload(csv.as_bytes()).unwrap();
    let all = label_examples(&DataLoader::from_dataframe(&df).unwrap());

    let partitions = EntityDisjointSplit::new(0.8, 0.2, seed)
        .unwrap()
        .split(all)
        .unwrap();

    assert!(partitions.test.is_empty());
    let train = products(&partitions.train);
    let validation = products(&partitions.validation);
    assert!(train.is_disjoint(&validation));
    assert_eq!(train.len() + validation.len(), n_products as usize);
    // floor(0.8 * n) products train, the rest validate
    assert_eq!(train.len(), (0.8 * n_products as f64).floor() as usize);
}

#[test]
fn test_entity_disjoint_is_reproducible_for_a_seed() {
    let first = EntityDisjointSplit::default().split(examples()).unwrap();
    let second = EntityDisjointSplit::default().split(examples()).unwrap();
    assert_eq!(products(&first.train), products(&second.train));
    assert_eq!(products(&first.test), products(&second.test));
}

#[test]
fn test_chronological_partitions_are_ordered_in_time() {
    let split = ChronologicalSplit::new(60.0, Some(80.0)).unwrap();
    let partitions = split.split(examples()).unwrap();

    let latest_train = partitions.train.iter().map(|e| e.dt).max().unwrap();
    let earliest_val = partitions.validation.iter().map(|e| e.dt).min().unwrap();
    let latest_val = partitions.validation.iter().map(|e| e.dt).max().unwrap();
    let earliest_test = partitions.test.iter().map(|e| e.dt).min().unwrap();

    assert!(latest_train < earliest_val);
    assert!(latest_val < earliest_test);
}

#[test]
fn test_scaler_ignores_held_out_partitions() {
    let partitions = EntityDisjointSplit::default().split(examples()).unwrap();
    let baseline = partitions.fit_scaler().unwrap();

    // Corrupt every held-out feature; the fitted parameters must not move
    let mut tampered: Partitions = partitions.clone();
    for example in tampered.validation.iter_mut().chain(tampered.test.iter_mut()) {
        let mut values = *example.features.numeric.values();
        values.iter_mut().for_each(|v| *v = 1e6);
        example.features.numeric = demand_forecast::FeatureVector::from_array(values);
    }

    assert_eq!(tampered.fit_scaler().unwrap(), baseline);
    assert_eq!(baseline.n_samples(), partitions.train.len());
}

// Tests for vole: checkpoint + ParamTree integration

use ndarray::ArrayD;

use vole::checkpoint::{self, CheckpointError};
use vole::params::{ParamError, ParamTree};

fn arr(shape: &[usize], values: &[f64]) -> ArrayD<f64> {
    ArrayD::from_shape_vec(shape.to_vec(), values.to_vec()).unwrap()
}

fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(name)
}

#[test]
fn params_roundtrip_through_file() {
    let mut tree = ParamTree::new();
    tree.insert("linreg/weight", arr(&[2], &[2.0, -3.4])).unwrap();
    tree.insert("linreg/bias", arr(&[1], &[4.2])).unwrap();

    let path = temp_path("vole_params_roundtrip.vole");
    checkpoint::save_params(&path, &tree).unwrap();
    let loaded = checkpoint::load_params(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(loaded, tree);
    assert_eq!(loaded.get("linreg/weight").unwrap()[[0]], 2.0);
}

#[test]
fn load_into_updates_matching_architecture() {
    let mut trained = ParamTree::new();
    trained.insert("m/w", arr(&[3], &[1.0, 2.0, 3.0])).unwrap();
    trained.insert("m/b", arr(&[1], &[0.5])).unwrap();

    let path = temp_path("vole_load_into.vole");
    checkpoint::save_params(&path, &trained).unwrap();

    // Fresh tree with the same architecture, different values.
    let mut fresh = ParamTree::new();
    fresh.insert("m/w", arr(&[3], &[0.0, 0.0, 0.0])).unwrap();
    fresh.insert("m/b", arr(&[1], &[0.0])).unwrap();

    let n = checkpoint::load_into(&path, &mut fresh).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(n, 2);
    assert_eq!(fresh, trained);
}

#[test]
fn load_into_mismatched_architecture_fails_at_apply() {
    let mut trained = ParamTree::new();
    trained.insert("m/w", arr(&[3], &[1.0, 2.0, 3.0])).unwrap();

    let path = temp_path("vole_load_into_mismatch.vole");
    checkpoint::save_params(&path, &trained).unwrap();

    // Wrong shape for m/w.
    let mut narrow = ParamTree::new();
    narrow.insert("m/w", arr(&[2], &[0.0, 0.0])).unwrap();
    let err = checkpoint::load_into(&path, &mut narrow);
    assert!(matches!(
        err,
        Err(CheckpointError::Param(ParamError::ShapeMismatch { .. }))
    ));

    // Missing key entirely.
    let mut renamed = ParamTree::new();
    renamed.insert("m/weight", arr(&[3], &[0.0, 0.0, 0.0])).unwrap();
    let err = checkpoint::load_into(&path, &mut renamed);
    std::fs::remove_file(&path).ok();
    assert!(matches!(
        err,
        Err(CheckpointError::Param(ParamError::Missing { .. }))
    ));
}

#[test]
fn single_entry_mapping_roundtrips_in_memory() {
    // The canonical {"x": tensor} round trip.
    let arrays = vec![("x".to_string(), arr(&[2, 3], &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]))];
    let bytes = checkpoint::to_bytes(&arrays).unwrap();
    let loaded = checkpoint::from_bytes(&bytes).unwrap();
    assert_eq!(loaded, arrays);
}

#[test]
fn flatten_order_survives_serialization() {
    let mut tree = ParamTree::new();
    tree.insert("b/y", arr(&[1], &[2.0])).unwrap();
    tree.insert("a/x", arr(&[1], &[1.0])).unwrap();
    tree.insert("a/z", arr(&[1], &[3.0])).unwrap();

    let bytes = checkpoint::to_bytes(&tree.flatten()).unwrap();
    let keys: Vec<String> = checkpoint::from_bytes(&bytes)
        .unwrap()
        .into_iter()
        .map(|(k, _)| k)
        .collect();
    assert_eq!(keys, vec!["a/x", "a/z", "b/y"]);
}

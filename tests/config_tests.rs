use kmeans_kernel::{KmeansConfig, KmeansError};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_builder_sets_fields() {
    let config = KmeansConfig::new(8)
        .with_max_iterations(40)
        .with_num_workers(3)
        .with_convergence_threshold(Some(2));

    assert_eq!(config.nclusters, 8);
    assert_eq!(config.max_iterations, 40);
    assert_eq!(config.num_workers, 3);
    assert_eq!(config.convergence_threshold, Some(2));

    let fixed = config.fixed_iterations(12);
    assert_eq!(fixed.max_iterations, 12);
    assert_eq!(fixed.convergence_threshold, None);
}

#[test]
fn test_defaults() {
    let config = KmeansConfig::default();
    assert_eq!(config.nclusters, 5);
    assert_eq!(config.max_iterations, 500);
    assert!(config.num_workers >= 1);
    assert_eq!(config.convergence_threshold, Some(0));
}

#[test]
fn test_yaml_file_fills_missing_fields_with_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("kmeans.yaml");
    fs::write(&path, "nclusters: 12\nnum_workers: 2\nconvergence_threshold: null\n").unwrap();

    let config = KmeansConfig::from_file(&path).expect("config should parse");

    assert_eq!(config.nclusters, 12);
    assert_eq!(config.num_workers, 2);
    assert_eq!(config.convergence_threshold, None);
    assert_eq!(config.max_iterations, KmeansConfig::default().max_iterations);
}

#[test]
fn test_bad_yaml_is_config_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("kmeans.yaml");
    fs::write(&path, "nclusters: many\n").unwrap();

    assert!(matches!(
        KmeansConfig::from_file(&path),
        Err(KmeansError::Config(_))
    ));
}

#[test]
fn test_validate_bounds() {
    let config = KmeansConfig::new(4).with_num_workers(2);
    assert!(config.validate(4, 1).is_ok());
    assert!(config.validate(3, 1).is_err());
    assert!(config.validate(10, 0).is_err());
    assert!(KmeansConfig::new(0).validate(10, 2).is_err());
}

use std::path::Path;

use super::*;

fn parse(yaml: &str) -> CatalogSeed {
    serde_yaml::from_str(yaml).expect("valid yaml")
}

const SAMPLE: &str = r"
sizes:
  - name: S
    description: Small
  - name: M
    description: Medium
colors:
  - name: Red
  - name: Blue
    active: false
categories:
  - name: Electronics
    children:
      - name: Phones
        children:
          - name: Smartphones
      - name: Laptops
  - name: Clothing
    description: Apparel
";

#[test]
fn sample_catalog_parses_and_validates() {
    let seed = parse(SAMPLE);
    validate_catalog_seed(&seed).expect("sample is valid");
    assert_eq!(seed.sizes.len(), 2);
    assert_eq!(seed.colors.len(), 2);
    assert_eq!(seed.categories.len(), 2);
    assert_eq!(seed.category_count(), 5);
}

#[test]
fn defaults_apply_to_missing_fields() {
    let seed = parse(SAMPLE);
    assert!(seed.colors[0].active);
    assert_eq!(seed.colors[0].description, "");
    assert!(!seed.colors[1].active);
    assert!(seed.categories[0].active);
    assert!(seed.categories[0].description.is_none());
    assert_eq!(seed.categories[1].description.as_deref(), Some("Apparel"));
}

#[test]
fn subtree_len_counts_nested_children() {
    let seed = parse(SAMPLE);
    assert_eq!(seed.categories[0].subtree_len(), 4);
    assert_eq!(seed.categories[1].subtree_len(), 1);
}

#[test]
fn empty_file_is_an_empty_catalog() {
    let seed = parse("{}");
    validate_catalog_seed(&seed).expect("empty is valid");
    assert_eq!(seed.category_count(), 0);
}

#[test]
fn duplicate_size_names_are_rejected() {
    let seed = parse(
        r"
sizes:
  - name: XL
  - name: xl
",
    );
    let err = validate_catalog_seed(&seed).expect_err("duplicate size");
    assert!(err.to_string().contains("duplicate size name"), "{err}");
}

#[test]
fn blank_color_name_is_rejected() {
    let seed = parse(
        r"
colors:
  - name: '  '
",
    );
    let err = validate_catalog_seed(&seed).expect_err("blank color");
    assert!(err.to_string().contains("color name must be non-empty"), "{err}");
}

#[test]
fn duplicate_sibling_categories_are_rejected() {
    let seed = parse(
        r"
categories:
  - name: Electronics
    children:
      - name: Phones
      - name: phones
",
    );
    let err = validate_catalog_seed(&seed).expect_err("duplicate siblings");
    assert!(err.to_string().contains("'phones'"), "{err}");
}

#[test]
fn same_name_under_different_parents_is_allowed() {
    let seed = parse(
        r"
categories:
  - name: Men
    children:
      - name: Shoes
  - name: Women
    children:
      - name: Shoes
",
    );
    validate_catalog_seed(&seed).expect("cousins may share names");
}

#[test]
fn load_catalog_seed_reports_missing_file() {
    let err = load_catalog_seed(Path::new("/nonexistent/catalog.yaml")).expect_err("missing");
    assert!(matches!(err, ConfigError::CatalogFileIo { .. }));
}

mod common;

use hypred::{
    OperatorFactory, Style,
    conf::{ConfigError, FactoryConfig, Syntax},
    ops::DEFAULT_MAX_DEPTH,
    registry::DEFAULT_PACKAGES,
};

#[test]
fn defaults() {
    let config = FactoryConfig::default();
    assert_eq!(config.style, Syntax::Xml);
    assert!(config.pretty);
    assert!(!config.verbose);
    assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
    assert_eq!(config.packages, DEFAULT_PACKAGES);
    assert_eq!(config.style(), Style::DEFAULT);
    assert_eq!(FactoryConfig::from_toml_str("").unwrap(), config);
}

#[test]
fn every_key() {
    let config = FactoryConfig::from_toml_str(
        r#"
        packages = ["java.lang.", "demo."]
        style = "paren"
        pretty = false
        verbose = true
        max_depth = 16
        "#,
    )
    .unwrap();
    assert_eq!(config.packages, vec!["java.lang.", "demo."]);
    assert_eq!(config.style(), Style::PAREN | Style::VERBOSE);
    assert_eq!(config.max_depth, 16);
}

#[test]
fn unknown_keys_are_rejected() {
    let err = FactoryConfig::from_toml_str("colour = true").unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "{err}");
    assert!(FactoryConfig::from_toml_str(r#"style = "json""#).is_err());
}

#[test]
fn style_overrides() {
    let config = FactoryConfig::default();
    assert_eq!(config.clone().with_style_override(Some("p")).style, Syntax::Paren);
    assert_eq!(config.clone().with_style_override(Some("PAREN")).style, Syntax::Paren);
    let paren = FactoryConfig {
        style: Syntax::Paren,
        ..FactoryConfig::default()
    };
    assert_eq!(paren.clone().with_style_override(Some(" x ")).style, Syntax::Xml);
    assert_eq!(paren.clone().with_style_override(Some("json")).style, Syntax::Paren);
    assert_eq!(paren.clone().with_style_override(Some("")).style, Syntax::Paren);
    assert_eq!(paren.with_style_override(None).style, Syntax::Paren);
}

#[test]
fn missing_file() {
    let err = FactoryConfig::from_path("/nonexistent/hypred.toml").unwrap_err();
    let ConfigError::Io { file, .. } = &err else {
        panic!("expected an io error, got {err}");
    };
    assert_eq!(file, "/nonexistent/hypred.toml");
}

#[test]
fn configured_packages_resolve_simple_names() {
    let registry = common::registry();
    let bare = OperatorFactory::with_config(
        registry.clone(),
        FactoryConfig {
            packages: vec!["java.lang.".into(), "java.util.".into()],
            ..FactoryConfig::default()
        },
    );
    assert!(bare.create_styled(Style::PAREN, "is:Person").unwrap_err().error.is_unknown_class());
    assert!(bare.create_styled(Style::PAREN, "is:demo.Person").is_ok());

    let demo = OperatorFactory::with_config(registry.clone(), common::config());
    assert!(demo.create_styled(Style::PAREN, "is:Person").is_ok());
    assert!(bare.create_styled(Style::PAREN, "is:Person").unwrap_err().error.is_unknown_class());
    assert_eq!(registry.packages(), DEFAULT_PACKAGES);

    let employee = demo.create_styled(Style::PAREN, "is:Employee").unwrap();
    assert_eq!(employee.to_string_styled(Style::PAREN), "(is:Employee)");
    let same = bare.create_styled(Style::PAREN, "is:demo.Employee").unwrap();
    assert_eq!(same.to_string_styled(Style::PAREN), "(is:demo.Employee)");
    assert_eq!(same, employee);
}

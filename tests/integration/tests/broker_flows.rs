//! SAML brokering flows through the advanced attribute importer.

use kc_broker::BrokerError;
use kc_protocol_saml::Attribute;

use crate::common::{assertion, strings, TestEnv};

const MAPPERS: &str = r#"[
    {
        "name": "email",
        "identityProviderAlias": "corp-saml",
        "identityProviderMapper": "saml-advanced-user-attribute-idp-mapper",
        "config": {
            "attribute.name": "urn:oid:0.9.2342.19200300.100.1.3",
            "user.attribute": "email",
            "attribute.regex.match": ".*@corp\\.example\\.com",
            "syncMode": "FORCE"
        }
    },
    {
        "name": "given name",
        "identityProviderAlias": "corp-saml",
        "identityProviderMapper": "saml-advanced-user-attribute-idp-mapper",
        "config": {
            "attribute.friendly.name": "givenName",
            "user.attribute": "FIRSTNAME"
        }
    },
    {
        "name": "department",
        "identityProviderAlias": "corp-saml",
        "identityProviderMapper": "saml-advanced-user-attribute-idp-mapper",
        "config": {
            "attribute.name": "dept",
            "user.attribute": "department",
            "attribute.regex.match": "^ENG.*"
        }
    },
    {
        "name": "disabled",
        "identityProviderAlias": "corp-saml",
        "identityProviderMapper": "saml-advanced-user-attribute-idp-mapper",
        "config": {
            "attribute.name": "dept",
            "user.attribute": ""
        }
    }
]"#;

fn full_assertion_attributes(dept: &[&str]) -> Vec<Attribute> {
    vec![
        Attribute::single("urn:oid:0.9.2342.19200300.100.1.3", "jdoe@corp.example.com")
            .with_friendly_name("mail")
            .with_format(Attribute::NAME_FORMAT_URI),
        Attribute::single("urn:oid:2.5.4.42", "John").with_friendly_name("givenName"),
        Attribute::multi("dept", strings(dept)),
    ]
}

#[test]
fn first_login_imports_all_mapped_attributes() -> anyhow::Result<()> {
    let env = TestEnv::from_json(MAPPERS)?;
    assert_eq!(env.mappers.len(), 4);

    let context = env.first_login(assertion(full_assertion_attributes(&["ENG-01", "ENG-02"])))?;

    assert_eq!(context.email.as_deref(), Some("jdoe@corp.example.com"));
    assert_eq!(context.first_name.as_deref(), Some("John"));
    assert_eq!(
        context.attributes.get("department"),
        Some(&strings(&["ENG-01", "ENG-02"]))
    );
    assert_eq!(context.attributes.len(), 1);
    Ok(())
}

#[test]
fn first_login_rejects_foreign_email_domain() -> anyhow::Result<()> {
    let env = TestEnv::from_json(MAPPERS)?;
    let mut attributes = full_assertion_attributes(&["ENG-01"]);
    attributes[0] = Attribute::single("urn:oid:0.9.2342.19200300.100.1.3", "jdoe@evil.example.com");

    let err = env.first_login(assertion(attributes)).unwrap_err();
    let err = err.downcast::<BrokerError>()?;

    assert!(matches!(
        err,
        BrokerError::RegexMismatch { ref value, .. } if value == "jdoe@evil.example.com"
    ));
    Ok(())
}

#[test]
fn first_login_tolerates_missing_attributes() -> anyhow::Result<()> {
    let env = TestEnv::from_json(MAPPERS)?;

    let context = env.first_login(assertion(vec![Attribute::single("uid", "jdoe")]))?;

    assert!(context.email.is_none());
    assert!(context.first_name.is_none());
    assert!(context.attributes.is_empty());
    Ok(())
}

#[test]
fn resync_with_unchanged_assertion_writes_nothing() -> anyhow::Result<()> {
    let env = TestEnv::from_json(MAPPERS)?;
    let context = env.first_login(assertion(full_assertion_attributes(&["ENG-01"])))?;
    let mut user = env.create_user(&context);
    let before = user.updated_at;

    env.resync(&mut user, assertion(full_assertion_attributes(&["ENG-01"])))?;

    assert_eq!(user.updated_at, before);
    assert_eq!(user.get_attribute("department"), Some(&strings(&["ENG-01"])[..]));
    Ok(())
}

#[test]
fn resync_applies_changes_and_removals() -> anyhow::Result<()> {
    let env = TestEnv::from_json(MAPPERS)?;
    let context = env.first_login(assertion(full_assertion_attributes(&["ENG-01"])))?;
    let mut user = env.create_user(&context);

    let mut changed = full_assertion_attributes(&["ENG-02"]);
    changed[1] = Attribute::single("urn:oid:2.5.4.42", "Johnny").with_friendly_name("givenName");
    env.resync(&mut user, assertion(changed))?;

    assert_eq!(user.first_name.as_deref(), Some("Johnny"));
    assert_eq!(user.get_attribute("department"), Some(&strings(&["ENG-02"])[..]));

    let mut dropped = full_assertion_attributes(&[]);
    dropped.truncate(2);
    env.resync(&mut user, assertion(dropped))?;

    assert_eq!(user.get_attribute("department"), None);
    assert_eq!(user.email.as_deref(), Some("jdoe@corp.example.com"));
    Ok(())
}

#[test]
fn resync_regex_mismatch_leaves_user_untouched() -> anyhow::Result<()> {
    let env = TestEnv::from_json(MAPPERS)?;
    let context = env.first_login(assertion(full_assertion_attributes(&["ENG-01"])))?;
    let mut user = env.create_user(&context);
    let before = user.updated_at;

    let err = env
        .resync(&mut user, assertion(full_assertion_attributes(&["SALES-01"])))
        .unwrap_err();

    assert!(err.downcast_ref::<BrokerError>().is_some_and(BrokerError::is_validation_error));
    assert_eq!(user.get_attribute("department"), Some(&strings(&["ENG-01"])[..]));
    assert_eq!(user.updated_at, before);
    Ok(())
}

#[test]
fn invalid_regex_is_rejected_when_loading_mappers() {
    let models = r#"[{
        "name": "broken",
        "identityProviderAlias": "corp-saml",
        "identityProviderMapper": "saml-advanced-user-attribute-idp-mapper",
        "config": { "attribute.name": "dept", "user.attribute": "department", "attribute.regex.match": "ENG(" }
    }]"#;

    let err = TestEnv::from_json(models).err().expect("invalid regex must fail");
    let err = err.downcast_ref::<BrokerError>().expect("broker error");
    assert!(matches!(err, BrokerError::InvalidRegex { .. }));
}

#[test]
fn import_only_mapper_is_not_refreshed_on_resync() -> anyhow::Result<()> {
    let models = r#"[{
        "name": "department",
        "identityProviderAlias": "corp-saml",
        "identityProviderMapper": "saml-advanced-user-attribute-idp-mapper",
        "config": { "attribute.name": "dept", "user.attribute": "department", "syncMode": "IMPORT" }
    }]"#;
    let env = TestEnv::from_json(models)?;
    let context = env.first_login(assertion(full_assertion_attributes(&["ENG-01"])))?;
    let mut user = env.create_user(&context);
    let before = user.updated_at;

    env.resync(&mut user, assertion(full_assertion_attributes(&["ENG-02"])))?;

    assert_eq!(user.get_attribute("department"), Some(&strings(&["ENG-01"])[..]));
    assert_eq!(user.updated_at, before);
    Ok(())
}

#[test]
fn unknown_sync_mode_is_rejected_when_loading_mappers() {
    let models = r#"[{
        "name": "department",
        "identityProviderAlias": "corp-saml",
        "identityProviderMapper": "saml-advanced-user-attribute-idp-mapper",
        "config": { "attribute.name": "dept", "user.attribute": "department", "syncMode": "SOMETIMES" }
    }]"#;

    let err = TestEnv::from_json(models).err().expect("unknown sync mode must fail");
    let err = err.downcast_ref::<BrokerError>().expect("broker error");
    assert!(err.is_config_error());
}

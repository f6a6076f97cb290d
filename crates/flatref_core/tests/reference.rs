use flatref_core::{is_valid_app_id, Reference, ReferenceError};

#[test]
fn canonical_form_round_trips() {
    let samples = [
        ("org.example.Foo", "x86_64", "stable"),
        ("com.valvesoftware.Steam", "aarch64", "beta"),
        ("io.github.user.App_Name", "i386", "master"),
    ];
    for (app_id, arch, branch) in samples {
        let reference = Reference::new(app_id, arch, branch).unwrap();
        let text = reference.to_string();
        assert_eq!(text, format!("app/{app_id}/{arch}/{branch}"));
        assert_eq!(text.parse::<Reference>().unwrap(), reference);
    }
}

#[test]
fn parse_tolerates_surrounding_whitespace() {
    let reference: Reference = "  app/org.example.Foo/x86_64/stable \t".parse().unwrap();
    assert_eq!(reference.app_id(), "org.example.Foo");
    assert_eq!(reference.arch(), "x86_64");
    assert_eq!(reference.branch(), "stable");
}

#[test]
fn parse_rejects_wrong_shapes() {
    assert!(matches!(
        "runtime/org.example.Platform/x86_64/23.08".parse::<Reference>(),
        Err(ReferenceError::MissingKind(_))
    ));
    assert!(matches!(
        "app/org.example.Foo/x86_64".parse::<Reference>(),
        Err(ReferenceError::SegmentCount(_))
    ));
    assert!(matches!(
        "app/org.example.Foo/x86_64/stable/extra".parse::<Reference>(),
        Err(ReferenceError::SegmentCount(_))
    ));
    assert!(matches!(
        "app/NoDots/x86_64/stable".parse::<Reference>(),
        Err(ReferenceError::InvalidAppId(_))
    ));
    assert!(matches!(
        "app/org.example.Foo//stable".parse::<Reference>(),
        Err(ReferenceError::InvalidToken { field: "architecture", .. })
    ));
}

#[test]
fn app_id_validation() {
    assert!(is_valid_app_id("org.example.Foo"));
    assert!(!is_valid_app_id(""));
    assert!(!is_valid_app_id("Foo"));
    assert!(!is_valid_app_id("org..Foo"));
    assert!(!is_valid_app_id(".org.Foo"));
    assert!(!is_valid_app_id("org.example Foo"));
}

use std::io::Write;

use tempfile::NamedTempFile;

#[test]
fn parse_file_write_file_reparse() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        "# demo config\n\
         greeting = hello   ; inline comment\n\
         \n\
         [server]\n\
         host = \"127.0.0.1\"\n\
         motd = \"first line\n  second line\"\n\
         \n\
         [server]\n\
         host = shadowed\n"
    )
    .unwrap();

    let parsed = xconfig::from_file(file.path()).unwrap();
    assert!(!parsed.has_errors());

    let config = parsed.config;
    assert_eq!(config.read(Some(""), "greeting"), Some("hello"));
    assert_eq!(config.read(Some("server"), "host"), Some("127.0.0.1"));
    assert_eq!(
        config.read(Some("server"), "motd"),
        Some("first line second line")
    );
    // duplicate [server] is a separate section, invisible to scoped
    // lookup but reachable without a section name once the key differs.
    assert_eq!(config.section_count(), 3);

    let out = NamedTempFile::new().unwrap();
    config.write_file(out.path()).unwrap();

    let again = xconfig::from_file(out.path()).unwrap();
    assert!(!again.has_errors());
    assert_eq!(again.config.sections(), config.sections());
}

#[test]
fn malformed_file_yields_partial_config_and_diagnostics() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        "good = 1\n\
         this line has no equals sign\n\
         [unclosed\n\
         still = fine\n"
    )
    .unwrap();

    let parsed = xconfig::from_file(file.path()).unwrap();
    assert_eq!(parsed.errors.len(), 2);
    // diagnostics carry the file name and line.
    let name = file.path().to_string_lossy().into_owned();
    assert!(parsed.errors.iter().all(|e| e.file_name == name));
    assert_eq!(parsed.errors[0].line, 2);
    assert_eq!(parsed.errors[1].line, 3);

    assert_eq!(parsed.config.read(None, "good"), Some("1"));
    assert_eq!(parsed.config.read(None, "still"), Some("fine"));
}

#[test]
fn missing_file_is_an_error() {
    let err = xconfig::from_file("/no/such/file.conf").unwrap_err();
    assert_eq!(err.kind, xconfig::ErrorKind::InvalidSource);
}

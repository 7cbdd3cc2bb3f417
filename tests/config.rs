// ABOUTME: Integration tests for configuration parsing and validation.
// ABOUTME: Tests YAML parsing, env var credentials, discovery, and destination merging.

use slotswap::config::*;
use slotswap::error::Error;
use slotswap::ssh::Credential;
use std::fs;
use std::time::Duration;

mod parsing {
    use super::*;

    #[test]
    fn parse_minimal_config() {
        let yaml = r#"
server: example.com
root: /var/www/site
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.server.host, "example.com");
        assert_eq!(config.server.port, 22);
        assert_eq!(config.root.as_str(), "/var/www/site");
        assert_eq!(config.health_check.paths().head, "index.html");
    }

    #[test]
    fn parse_full_config() {
        let yaml = r#"
server:
  host: deploy.example.com
  port: 2222
  user: deploy
  password: { env: SLOTSWAP_PASSWORD }
  trust_first_connection: false
  command_timeout: 90s
root: /var/www/site
source: dist
pool_size: 4
parallelism: 16
slots:
  staging: next
  backup: previous
health_check:
  paths: [index.html, assets/app.js]
retry:
  max_retries: 5
  base_delay: 250ms
destinations:
  production:
    root: /var/www/prod
    server: deploy@prod.example.com
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.server.port, 2222);
        assert!(!config.server.trust_first_connection);
        assert_eq!(config.server.command_timeout, Duration::from_secs(90));
        assert_eq!(config.pool_size, 4);
        assert_eq!(config.parallelism, 16);
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.retry.base_delay, Duration::from_millis(250));
        assert_eq!(config.health_check.paths().len(), 2);

        let layout = config.layout().unwrap();
        assert_eq!(layout.staging().as_str(), "/var/www/site/next");
        assert_eq!(layout.backup().as_str(), "/var/www/site/previous");
    }

    #[test]
    fn missing_root_is_an_error() {
        let err = Config::from_yaml("server: example.com\n").unwrap_err();
        assert!(matches!(err, Error::Yaml(_)));
    }

    #[test]
    fn nested_slot_name_is_rejected() {
        let yaml = "server: example.com\nroot: /srv\nslots: { staging: a/b }\n";
        assert!(matches!(Config::from_yaml(yaml), Err(Error::Slot(_))));
    }
}

mod credentials {
    use super::*;

    const YAML: &str = r#"
server:
  host: example.com
  user: deploy
  password: { env: SLOTSWAP_TEST_PASSWORD }
root: /srv/site
"#;

    #[test]
    fn password_is_read_from_environment() {
        let config = Config::from_yaml(YAML).unwrap();
        temp_env::with_var("SLOTSWAP_TEST_PASSWORD", Some("from_environment"), || {
            let session = config.server.session_config().unwrap();
            assert!(matches!(
                session.credential,
                Credential::Password(ref p) if p == "from_environment"
            ));
        });
    }

    #[test]
    fn unset_password_variable_fails() {
        let config = Config::from_yaml(YAML).unwrap();
        temp_env::with_var_unset("SLOTSWAP_TEST_PASSWORD", || {
            let err = config.server.session_config().unwrap_err();
            assert!(matches!(err, Error::MissingEnvVar(ref v) if v == "SLOTSWAP_TEST_PASSWORD"));
        });
    }

    #[test]
    fn user_defaults_to_login_name() {
        let config = Config::from_yaml("server: example.com\nroot: /srv\n").unwrap();
        temp_env::with_var("USER", Some("ci-runner"), || {
            let session = config.server.session_config().unwrap();
            assert_eq!(session.user, "ci-runner");
            assert!(matches!(session.credential, Credential::Auto));
        });
    }
}

mod discovery {
    use super::*;

    #[test]
    fn finds_primary_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME), "server: a\nroot: /srv\n").unwrap();

        let config = Config::discover(dir.path()).unwrap();
        assert_eq!(config.server.host, "a");
        assert_eq!(config.config_dir.as_deref(), Some(dir.path()));
    }

    #[test]
    fn dot_directory_config_resolves_source_from_project() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join(".slotswap")).unwrap();
        fs::write(
            dir.path().join(CONFIG_FILENAME_DIR),
            "server: a\nroot: /srv\nsource: public\n",
        )
        .unwrap();

        let config = Config::discover(dir.path()).unwrap();
        assert_eq!(config.source_path(), Some(dir.path().join("public")));
    }

    #[test]
    fn missing_config_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Config::discover(dir.path()),
            Err(Error::ConfigNotFound(_))
        ));
    }
}

mod destinations {
    use super::*;

    #[test]
    fn destination_keeps_unset_fields() {
        let yaml = r#"
server: deploy@staging.example.com
root: /var/www/site
pool_size: 3
destinations:
  production:
    server: prod.example.com
"#;
        let config = Config::from_yaml(yaml).unwrap();
        let prod = config.for_destination("production").unwrap();
        assert_eq!(prod.server.host, "prod.example.com");
        assert_eq!(prod.root.as_str(), "/var/www/site");
        assert_eq!(prod.pool_size, 3);
    }

    #[test]
    fn blank_destination_root_is_rejected() {
        let yaml = "server: a\nroot: /srv\ndestinations:\n  x:\n    root: ''\n";
        assert!(Config::from_yaml(yaml).is_err());
    }
}

mod init {
    use super::*;

    #[test]
    fn writes_template_with_overrides() {
        let dir = tempfile::tempdir().unwrap();
        init_config(dir.path(), Some("ops@web1:2200"), Some("/srv/app"), false).unwrap();

        let config = Config::discover(dir.path()).unwrap();
        assert_eq!(config.server.host, "web1");
        assert_eq!(config.server.port, 2200);
        assert_eq!(config.server.user.as_deref(), Some("ops"));
        assert_eq!(config.root.as_str(), "/srv/app");
    }

    #[test]
    fn refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        init_config(dir.path(), None, None, false).unwrap();
        assert!(matches!(
            init_config(dir.path(), None, None, false),
            Err(Error::AlreadyExists(_))
        ));
        init_config(dir.path(), None, None, true).unwrap();
    }
}

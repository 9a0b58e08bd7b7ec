use config::load_config;
use config::shared::RunnerConfig;

use crate::error::{RunnerError, RunnerResult};

/// Loads the runner configuration, rejecting invalid values.
pub fn load_runner_config() -> RunnerResult<RunnerConfig> {
    load_config::<RunnerConfig>().map_err(RunnerError::config)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use ::config::shared::{Materialization, ValidationError};
    use ::config::{Environment, LoadConfigError, load_config_from};

    use super::*;

    fn shipped_config(environment: Environment) -> Result<RunnerConfig, LoadConfigError> {
        load_config_from(Path::new(env!("CARGO_MANIFEST_DIR")), environment)
    }

    #[test]
    fn test_shipped_dev_configuration_is_valid() {
        let config = shipped_config(Environment::Dev).unwrap();

        assert_eq!(config.seeds[0].name, "my_seed_data");
        assert_eq!(config.transform.upstream, "my_seed_data");
        assert_eq!(config.sql_models[0].materialized, Materialization::Table);
        assert_eq!(config.export.upstream, "my_sql_model");
        assert_eq!(
            config.export.destination.to_libpq_conninfo(),
            "dbname=mydb user=postgres password=postgres host=127.0.0.1 port=5432"
        );
        assert!(!config.export.atomic_replace);
    }

    #[test]
    fn test_shipped_prod_configuration_requires_root_certs() {
        let err = shipped_config(Environment::Prod).unwrap_err();

        assert!(matches!(
            err,
            LoadConfigError::Validation(ValidationError::MissingTrustedRootCerts)
        ));
    }
}

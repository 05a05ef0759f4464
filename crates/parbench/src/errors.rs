//! Error handling and exit codes.

use parbench_core::constants::exit_codes;
use parbench_core::ParError;
use parbench_orchestration::HarnessError;

/// Exit code for a core error.
pub fn handle_error(err: &ParError) -> i32 {
    if err.is_configuration() {
        exit_codes::ERROR_CONFIG
    } else {
        exit_codes::ERROR_GENERIC
    }
}

/// Exit code for a harness error.
pub fn handle_harness_error(err: &HarnessError) -> i32 {
    match err {
        HarnessError::Mismatch { .. } => exit_codes::ERROR_MISMATCH,
        HarnessError::NoResults => exit_codes::ERROR_GENERIC,
        HarnessError::Core(e) => handle_error(e),
    }
}

/// Exit code for any error reaching `main`.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    if let Some(e) = err.downcast_ref::<HarnessError>() {
        handle_harness_error(e)
    } else if let Some(e) = err.downcast_ref::<ParError>() {
        handle_error(e)
    } else {
        exit_codes::ERROR_GENERIC
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes() {
        assert_eq!(handle_error(&ParError::Zero("workers")), 4);
        assert_eq!(
            handle_error(&ParError::TooManyWorkers {
                workers: 17,
                max: 16
            }),
            4
        );
        assert_eq!(handle_error(&ParError::InvalidInput("x".into())), 1);
        assert_eq!(
            handle_harness_error(&HarnessError::Mismatch {
                methods: vec!["atomic".into()]
            }),
            3
        );
        assert_eq!(handle_harness_error(&HarnessError::NoResults), 1);
    }

    #[test]
    fn exit_code_survives_context() {
        let err = anyhow::Error::new(ParError::InvalidPartition { size: 100, tasks: 7 })
            .context("running fixed-task");
        assert_eq!(exit_code(&err), 4);
        let core = HarnessError::Core(ParError::InvalidPartition { size: 100, tasks: 7 });
        assert_eq!(exit_code(&anyhow::Error::new(core).context("running fixed-task")), 4);
        let err = anyhow::Error::new(HarnessError::NoResults);
        assert_eq!(exit_code(&err), 1);
        assert_eq!(exit_code(&anyhow::anyhow!("other")), 1);
    }
}

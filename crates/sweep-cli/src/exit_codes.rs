//! Process exit codes. These are part of the CLI contract.

use sweep_core::SweepError;

pub const SUCCESS: i32 = 0;
pub const CONFIG_ERROR: i32 = 1; // Missing dataset/example, bad config or arguments
pub const AUTH_ERROR: i32 = 2;
pub const UNSUPPORTED_PREDICTOR: i32 = 3;
pub const RUN_FAILED: i32 = 4; // Workers panicked or did not stop
pub const NETWORK_ERROR: i32 = 5;

/// Exit code for an error bubbled up to `main`.
pub fn from_error(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|e| e.downcast_ref::<SweepError>())
        .map(SweepError::exit_code)
        .unwrap_or(CONFIG_ERROR)
}

/// Whether the run failed after workers started, as opposed to during setup.
pub fn aborted_mid_run(err: &anyhow::Error) -> bool {
    err.chain()
        .find_map(|e| e.downcast_ref::<SweepError>())
        .is_some_and(|e| !e.is_preflight())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_sweep_errors_through_anyhow() {
        let err = anyhow::Error::new(SweepError::UnsupportedPredictorKind {
            kind: "tool".into(),
        });
        assert_eq!(from_error(&err), UNSUPPORTED_PREDICTOR);

        let err = anyhow::Error::new(SweepError::Unauthorized {
            message: "no".into(),
        })
        .context("listing datasets");
        assert_eq!(from_error(&err), AUTH_ERROR);

        let err = anyhow::Error::new(SweepError::Network {
            message: "refused".into(),
        });
        assert_eq!(from_error(&err), NETWORK_ERROR);

        let err = anyhow::Error::new(SweepError::WorkerPanicked {
            message: "boom".into(),
        });
        assert_eq!(from_error(&err), RUN_FAILED);
    }

    #[test]
    fn other_errors_are_config_errors() {
        assert_eq!(from_error(&anyhow::anyhow!("bad flag")), CONFIG_ERROR);
    }

    #[test]
    fn only_run_failures_abort_mid_run() {
        let err = anyhow::Error::new(SweepError::WorkerPanicked {
            message: "boom".into(),
        });
        assert!(aborted_mid_run(&err));

        let err = anyhow::Error::new(SweepError::DatasetNotFound {
            reference: "qa".into(),
        });
        assert!(!aborted_mid_run(&err));
        assert!(!aborted_mid_run(&anyhow::anyhow!("bad flag")));
    }
}

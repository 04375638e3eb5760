//! PDF password removal.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use docmill_core::AppError;
use docmill_core::AppResult;
use docmill_core::config::convert::ConvertConfig;
use docmill_core::error::ErrorKind;
use docmill_entity::conversion::{ConversionType, ConvertOutcome};
use docmill_entity::options::{ConversionOptions, UnlockOptions};

use crate::pdf;
use crate::strategy::{ConversionStrategy, ConvertRequest};
use crate::tool::{ToolExecutor, ToolProbe, ToolRun};

/// Removes PDF encryption via qpdf. The native fallback only handles
/// inputs that were never encrypted; real decryption needs the tool.
pub struct UnlockPdf {
    qpdf_bin: String,
    executor: ToolExecutor,
    probe: Arc<ToolProbe>,
}

impl UnlockPdf {
    pub fn new(config: &ConvertConfig, executor: ToolExecutor, probe: Arc<ToolProbe>) -> Self {
        Self {
            qpdf_bin: config.qpdf_bin.clone(),
            executor,
            probe,
        }
    }
}

#[async_trait]
impl ConversionStrategy for UnlockPdf {
    fn conversion(&self) -> ConversionType {
        ConversionType::UnlockPdf
    }

    fn tool(&self) -> Option<&str> {
        Some(&self.qpdf_bin)
    }

    async fn convert(&self, request: &ConvertRequest) -> AppResult<ConvertOutcome> {
        let ConversionOptions::UnlockPdf(options) = request.options.clone() else {
            return Err(AppError::internal("Mismatched options for unlock-pdf"));
        };
        let password = options.password.filter(|p| !p.is_empty());

        let input = request.input()?.to_path_buf();
        let output = request
            .output_dir
            .join(format!("{}_unlocked.pdf", request.base_stem()));
        request.progress.report(10);

        if self.probe.available(&self.qpdf_bin).await {
            let mut args = Vec::new();
            if let Some(password) = &password {
                args.push(format!("--password={password}"));
            }
            args.push("--decrypt".to_string());
            args.push(input.display().to_string());
            args.push(output.display().to_string());

            let run = self.executor.run_unchecked(&self.qpdf_bin, &args).await?;
            if !run.success() {
                return Err(classify_qpdf_failure(&run, password.is_some()));
            }
            self.executor.expect_output(&self.qpdf_bin, &output).await?;
            request.progress.report(90);
            return Ok(ConvertOutcome::new(output));
        }

        let result_path = output.clone();
        tokio::task::spawn_blocking(move || {
            unlock_native(&input, &result_path, password.as_deref())
        })
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Internal, "Unlock task panicked", e))??;
        request.progress.report(90);

        Ok(ConvertOutcome::new(output))
    }
}

/// Map a failed qpdf run onto the password error taxonomy.
fn classify_qpdf_failure(run: &ToolRun, password_supplied: bool) -> AppError {
    let stderr = run.stderr.to_lowercase();
    if stderr.contains("invalid password") {
        if password_supplied {
            AppError::invalid_password("The password is incorrect")
        } else {
            AppError::encrypted_without_password("This PDF requires a password to unlock")
        }
    } else {
        AppError::external_tool(format!("qpdf failed: {}", run.stderr_snippet()))
    }
}

/// Without qpdf, pass unencrypted files through untouched and refuse
/// encrypted ones with the precise reason.
fn unlock_native(input: &Path, output: &Path, password: Option<&str>) -> AppResult<()> {
    match pdf::encryption_status(input)? {
        pdf::EncryptionStatus::Clear => {
            std::fs::copy(input, output)
                .map_err(|e| AppError::with_source(ErrorKind::Io, "Failed to copy file", e))?;
            Ok(())
        }
        pdf::EncryptionStatus::Encrypted => {
            if password.is_some() {
                Err(AppError::external_tool(
                    "qpdf is required to unlock password-protected files",
                ))
            } else {
                Err(AppError::encrypted_without_password(
                    "This PDF requires a password to unlock",
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;

    fn failed_run(stderr: &str) -> ToolRun {
        ToolRun {
            code: Some(2),
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }

    #[test]
    fn wrong_password_classified() {
        let run = failed_run("in.pdf: invalid password");
        let err = classify_qpdf_failure(&run, true);
        assert_eq!(err.kind, ErrorKind::InvalidPassword);
    }

    #[test]
    fn missing_password_classified() {
        let run = failed_run("in.pdf: invalid password");
        let err = classify_qpdf_failure(&run, false);
        assert_eq!(err.kind, ErrorKind::EncryptedWithoutPassword);
    }

    #[test]
    fn other_failures_stay_external_tool() {
        let run = failed_run("in.pdf: file is damaged");
        let err = classify_qpdf_failure(&run, true);
        assert_eq!(err.kind, ErrorKind::ExternalTool);
        assert!(err.message.contains("damaged"));
    }

    #[test]
    fn native_copies_unencrypted_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = testutil::pdf_with_pages(dir.path(), "clear.pdf", &["ok"]);
        let output = dir.path().join("out.pdf");

        unlock_native(&input, &output, None).unwrap();
        assert_eq!(
            std::fs::read(&input).unwrap(),
            std::fs::read(&output).unwrap()
        );
    }

    #[test]
    fn native_refuses_encrypted_without_password() {
        let dir = tempfile::tempdir().unwrap();
        let input = testutil::pdf_with_encrypt_marker(dir.path(), "locked.pdf");

        let err = unlock_native(&input, &dir.path().join("out.pdf"), None).unwrap_err();
        assert_eq!(err.kind, ErrorKind::EncryptedWithoutPassword);
    }

    #[test]
    fn native_refuses_encrypted_with_password() {
        let dir = tempfile::tempdir().unwrap();
        let input = testutil::pdf_with_encrypt_marker(dir.path(), "locked.pdf");

        let err = unlock_native(&input, &dir.path().join("out.pdf"), Some("pw")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ExternalTool);
    }

    #[tokio::test]
    async fn strategy_unlocks_clear_file_without_qpdf() {
        let dir = tempfile::tempdir().unwrap();
        let input = testutil::pdf_with_pages(dir.path(), "form.pdf", &["fields"]);

        let config = ConvertConfig::default();
        let probe = Arc::new(ToolProbe::new());
        probe.preset(config.qpdf_bin.clone(), false);

        let strategy = UnlockPdf::new(&config, ToolExecutor::new(&config), probe);
        let request = ConvertRequest::new(
            vec![input],
            "form.pdf",
            ConversionOptions::UnlockPdf(UnlockOptions::default()),
            dir.path(),
        );
        let outcome = strategy.convert(&request).await.unwrap();
        assert_eq!(outcome.file_name(), "form_unlocked.pdf");
        assert!(!outcome.degraded);
    }
}

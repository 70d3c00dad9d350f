use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use iso_gateway::headers::{self, HeaderCheck};
use iso_gateway::{
    Action, Destination, GatewayEnv, Product, SubmissionContext, SubmissionResult,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::env::{Env, LogLevel};
use crate::upload::Upload;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Header row of {} does not match {destination} {product}", file.display())]
    HeaderMismatch {
        file: PathBuf,
        destination: Destination,
        product: Product,
    },
    #[error("{action} failed: {message}")]
    Rejected { action: Action, message: String },
}

/// Which destination and product an upload is meant for.
#[derive(Debug, Clone, Args)]
pub struct Selection {
    /// Destination ISO: ERCOT, PJMISO, NEISO, CAISO, MISO, NYISO or SPPISO
    #[arg(long = "iso")]
    pub destination: Destination,
    /// "Virtual Bid", "Virtual Offer" or "UTC/Spread"
    #[arg(long)]
    pub product: Product,
}

#[derive(Debug, Clone, Args)]
pub struct Account {
    /// Trading account name sent as X-Account-Name
    #[arg(long = "account")]
    pub account_name: String,
    /// Trade date (YYYY-MM-DD), must be after today
    #[arg(long)]
    pub trade_date: NaiveDate,
    /// Account password, required by PJMISO and NYISO
    #[arg(long, env = "ISO_ACCOUNT_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Compare an upload's header row with the columns the destination expects
    Headers {
        #[command(flatten)]
        selection: Selection,
        /// CSV upload with a header row
        #[arg(short = 'f', long = "file")]
        file: PathBuf,
    },
    /// Submit the orders in an upload
    Submit {
        #[command(flatten)]
        selection: Selection,
        #[command(flatten)]
        account: Account,
        #[arg(short = 'f', long = "file")]
        file: PathBuf,
    },
    /// Withdraw orders. Destinations that withdraw by node need an upload listing them
    Withdraw {
        #[command(flatten)]
        selection: Selection,
        #[command(flatten)]
        account: Account,
        #[arg(short = 'f', long = "file")]
        file: Option<PathBuf>,
    },
    /// Run the destination's validation endpoint against an upload without submitting
    Check {
        #[command(flatten)]
        selection: Selection,
        #[command(flatten)]
        account: Account,
        #[arg(short = 'f', long = "file")]
        file: PathBuf,
    },
}

#[derive(Debug, Parser)]
#[command(name = "iso-submit")]
#[command(about = "Validate, submit and withdraw virtual and spread orders at ISO markets")]
#[command(version)]
pub struct CliEnv {
    #[clap(long, env, default_value = "info")]
    pub log_level: LogLevel,
    #[clap(flatten)]
    pub gateway: GatewayEnv,
    #[clap(long, env)]
    pub otlp_endpoint: Option<url::Url>,
    #[clap(long, env, default_value = "iso-submit")]
    pub otlp_service_name: String,
    #[clap(long, env, default_value = "production")]
    pub otlp_environment: String,
    #[command(subcommand)]
    pub command: Commands,
}

impl CliEnv {
    /// Parse CLI arguments and convert to internal Env struct
    pub fn parse_and_convert() -> anyhow::Result<(Env, Commands)> {
        let cli_env = Self::parse();

        let env = Env {
            log_level: cli_env.log_level,
            gateway: cli_env.gateway,
            otlp_endpoint: cli_env.otlp_endpoint,
            otlp_service_name: cli_env.otlp_service_name,
            otlp_environment: cli_env.otlp_environment,
        };

        Ok((env, cli_env.command))
    }
}

pub async fn run_command(env: &Env, command: Commands) -> anyhow::Result<()> {
    run_command_with_writers(env, command, &mut std::io::stdout()).await
}

fn submission_context(
    selection: Selection,
    account: Account,
    action: Action,
    upload: Upload,
) -> SubmissionContext {
    SubmissionContext {
        destination: Some(selection.destination),
        product: Some(selection.product),
        action,
        account_name: Some(account.account_name),
        password: account.password,
        trade_date: Some(account.trade_date),
        columns: upload.columns,
        rows: upload.rows,
    }
}

async fn run_command_with_writers<W: Write>(
    env: &Env,
    command: Commands,
    stdout: &mut W,
) -> anyhow::Result<()> {
    let (action, context) = match command {
        Commands::Headers { selection, file } => {
            return check_headers_with_writers(&selection, &file, stdout);
        }
        Commands::Submit {
            selection,
            account,
            file,
        } => {
            let upload = Upload::from_path(&file)?;
            (Action::Submit, submission_context(selection, account, Action::Submit, upload))
        }
        Commands::Withdraw {
            selection,
            account,
            file,
        } => {
            let upload = file
                .as_deref()
                .map(Upload::from_path)
                .transpose()?
                .unwrap_or_default();
            (
                Action::Withdraw,
                submission_context(selection, account, Action::Withdraw, upload),
            )
        }
        Commands::Check {
            selection,
            account,
            file,
        } => {
            let upload = Upload::from_path(&file)?;
            (
                Action::Validate,
                submission_context(selection, account, Action::Validate, upload),
            )
        }
    };

    info!(
        "Processing {action}: destination={:?}, product={:?}, rows={}",
        context.destination,
        context.product,
        context.rows.len()
    );

    let submitter = env.submitter()?;
    let result = submitter.submit(context).await;
    report_result(action, &result, stdout)?;

    if !result.success {
        return Err(CliError::Rejected {
            action,
            message: result.message,
        }
        .into());
    }

    info!("CLI operation completed successfully");
    Ok(())
}

fn report_result<W: Write>(
    action: Action,
    result: &SubmissionResult,
    stdout: &mut W,
) -> anyhow::Result<()> {
    if result.success {
        writeln!(stdout, "✅ {action} accepted: {}", result.message)?;
    } else {
        writeln!(stdout, "❌ {action} failed: {}", result.message)?;
    }
    if let Some(correlation_id) = &result.correlation_id {
        writeln!(stdout, "   Correlation ID: {correlation_id}")?;
    }
    writeln!(stdout, "{}", serde_json::to_string_pretty(result)?)?;
    Ok(())
}

fn check_headers_with_writers<W: Write>(
    selection: &Selection,
    file: &Path,
    stdout: &mut W,
) -> anyhow::Result<()> {
    let Selection {
        destination,
        product,
    } = *selection;
    let upload = Upload::from_path(file)?;

    match headers::check(destination, product.kind(), &upload.columns) {
        HeaderCheck::NoUpload => {
            writeln!(stdout, "❌ No header row found in {}", file.display())?;
            Err(CliError::HeaderMismatch {
                file: file.to_path_buf(),
                destination,
                product,
            }
            .into())
        }
        HeaderCheck::NoRules { destination, kind } => {
            writeln!(
                stdout,
                "⚠️ No validation rules are registered for {destination} {kind}"
            )?;
            Ok(())
        }
        HeaderCheck::Checked(diagnostic) => {
            if diagnostic.ok {
                writeln!(stdout, "✅ Headers match {destination} {product}")?;
            } else {
                writeln!(stdout, "❌ {}", diagnostic.summary())?;
            }
            writeln!(stdout, "{}", serde_json::to_string_pretty(&diagnostic)?)?;

            if diagnostic.ok {
                Ok(())
            } else {
                Err(CliError::HeaderMismatch {
                    file: file.to_path_buf(),
                    destination,
                    product,
                }
                .into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::tests::create_test_env;
    use httpmock::MockServer;
    use iso_gateway::test::upcoming_trade_date;
    use serde_json::json;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    fn csv_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn account(password: Option<&str>) -> Account {
        Account {
            account_name: "TRADER1".to_string(),
            trade_date: upcoming_trade_date(),
            password: password.map(str::to_string),
        }
    }

    const ERCOT_VIRTUALS: &str =
        "node,he,tranche,mw,price,is_block\nHB_WEST,16,1,10.5,25.3,false\n";

    #[tokio::test]
    async fn test_submit_ercot_bids() {
        let server = MockServer::start();
        let trade_date = upcoming_trade_date().format("%Y-%m-%d").to_string();
        let mock = server.mock(|when, then| {
            when.method(httpmock::Method::POST)
                .path("/ercot/v1/submit/virtual-bids")
                .header("x-account-name", "TRADER1")
                .header("x-trade-date", trade_date.as_str())
                .json_body(json!([{
                    "node": "HB_WEST",
                    "he": "16",
                    "tranche": 1,
                    "mw": 10.5,
                    "price": 25.3,
                    "is_block": false
                }]));
            then.status(200).json_body(json!({
                "message": "Accepted 1 bid",
                "status_code": 200,
                "correlation_id": "9f1e-22"
            }));
        });

        let file = csv_file(ERCOT_VIRTUALS);
        let command = Commands::Submit {
            selection: Selection {
                destination: Destination::Ercot,
                product: Product::VirtualBid,
            },
            account: account(None),
            file: file.path().to_path_buf(),
        };

        let mut stdout = Vec::new();
        run_command_with_writers(&create_test_env(&server.base_url()), command, &mut stdout)
            .await
            .unwrap();

        mock.assert();
        let output = String::from_utf8(stdout).unwrap();
        assert!(output.contains("✅ submit accepted: Accepted 1 bid"));
        assert!(output.contains("Correlation ID: 9f1e-22"));
        assert!(output.contains("\"correlationId\": \"9f1e-22\""));
    }

    #[tokio::test]
    async fn test_rejected_submission_is_an_error() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(httpmock::Method::POST)
                .path("/pjmiso/v1/submit/virtual-offers")
                .header("x-account-password", "hunter2");
            then.status(401)
                .header("content-type", "text/plain")
                .body("Unauthorized - correlation: ab12-cd34");
        });

        let file = csv_file("node,node_id,he,tranche,mw,price\nWESTERN HUB,51288,8,1,5,40\n");
        let command = Commands::Submit {
            selection: Selection {
                destination: Destination::Pjmiso,
                product: Product::VirtualOffer,
            },
            account: account(Some("hunter2")),
            file: file.path().to_path_buf(),
        };

        let mut stdout = Vec::new();
        let error =
            run_command_with_writers(&create_test_env(&server.base_url()), command, &mut stdout)
                .await
                .unwrap_err();

        mock.assert();
        assert_eq!(error.to_string(), "submit failed: Unauthorized");
        let output = String::from_utf8(stdout).unwrap();
        assert!(output.contains("❌ submit failed: Unauthorized"));
        assert!(output.contains("Correlation ID: ab12-cd34"));
    }

    #[tokio::test]
    async fn test_withdraw_without_file() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(httpmock::Method::POST)
                .path("/caiso/v1/withdraw/virtual-offers")
                .json_body(json!({}));
            then.status(200)
                .json_body(json!({"message": "Withdrawn", "status_code": 200}));
        });

        let command = Commands::Withdraw {
            selection: Selection {
                destination: Destination::Caiso,
                product: Product::VirtualOffer,
            },
            account: account(None),
            file: None,
        };

        let mut stdout = Vec::new();
        run_command_with_writers(&create_test_env(&server.base_url()), command, &mut stdout)
            .await
            .unwrap();

        mock.assert();
    }

    #[tokio::test]
    async fn test_unsupported_spread_makes_no_request() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(httpmock::Method::POST);
            then.status(200);
        });

        let file = csv_file("source,sink,he,tranche,mw,price\nA,B,1,1,1,1\n");
        let command = Commands::Check {
            selection: Selection {
                destination: Destination::Sppiso,
                product: Product::Spread,
            },
            account: account(None),
            file: file.path().to_path_buf(),
        };

        let mut stdout = Vec::new();
        let error =
            run_command_with_writers(&create_test_env(&server.base_url()), command, &mut stdout)
                .await
                .unwrap_err();

        mock.assert_hits(0);
        assert!(error.to_string().contains("not supported by SPPISO"));
        assert!(String::from_utf8(stdout).unwrap().contains("\"errorKind\": \"configuration\""));
    }

    #[test]
    fn test_headers_match() {
        let file = csv_file(ERCOT_VIRTUALS);
        let selection = Selection {
            destination: Destination::Ercot,
            product: Product::VirtualBid,
        };

        let mut stdout = Vec::new();
        check_headers_with_writers(&selection, file.path(), &mut stdout).unwrap();

        let output = String::from_utf8(stdout).unwrap();
        assert!(output.contains("✅ Headers match ERCOT Virtual Bid"));
        assert!(output.contains("\"ok\": true"));
    }

    #[test]
    fn test_headers_mismatch() {
        let file = csv_file("node,he,tranche,mw,price\nHB_WEST,16,1,10.5,25.3\n");
        let selection = Selection {
            destination: Destination::Ercot,
            product: Product::VirtualBid,
        };

        let mut stdout = Vec::new();
        let error = check_headers_with_writers(&selection, file.path(), &mut stdout).unwrap_err();

        let output = String::from_utf8(stdout).unwrap();
        assert!(output.contains("❌ Missing: is_block"));
        assert!(error.to_string().contains("does not match ERCOT Virtual Bid"));
    }

    #[test]
    fn test_headers_without_rules_are_informational() {
        let file = csv_file("source,sink\nA,B\n");
        let selection = Selection {
            destination: Destination::Miso,
            product: Product::Spread,
        };

        let mut stdout = Vec::new();
        check_headers_with_writers(&selection, file.path(), &mut stdout).unwrap();

        assert!(
            String::from_utf8(stdout)
                .unwrap()
                .contains("No validation rules are registered for MISO SPREAD")
        );
    }

    #[test]
    fn test_cli_parses_submit() {
        let cli = CliEnv::try_parse_from([
            "iso-submit",
            "--base-url",
            "https://api.example.com",
            "submit",
            "--iso",
            "pjmiso",
            "--product",
            "Virtual Offer",
            "--account",
            "TRADER1",
            "--trade-date",
            "2030-01-15",
            "--password",
            "hunter2",
            "--file",
            "orders.csv",
        ])
        .unwrap();

        let Commands::Submit {
            selection,
            account,
            file,
        } = cli.command
        else {
            panic!("expected submit");
        };
        assert_eq!(selection.destination, Destination::Pjmiso);
        assert_eq!(selection.product, Product::VirtualOffer);
        assert_eq!(account.trade_date, NaiveDate::from_ymd_opt(2030, 1, 15).unwrap());
        assert_eq!(account.password.as_deref(), Some("hunter2"));
        assert_eq!(file, PathBuf::from("orders.csv"));
        assert_eq!(cli.otlp_environment, "production");
    }

    #[test]
    fn test_cli_rejects_unknown_iso() {
        assert!(
            CliEnv::try_parse_from([
                "iso-submit",
                "--base-url",
                "https://api.example.com",
                "headers",
                "--iso",
                "ISONE",
                "--product",
                "spread",
                "--file",
                "orders.csv",
            ])
            .is_err()
        );
    }

    #[test]
    fn test_cli_error_display_messages() {
        let error = CliError::Rejected {
            action: Action::Withdraw,
            message: "Password is required for NYISO submissions".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "withdraw failed: Password is required for NYISO submissions"
        );
    }
}

use anyhow::Result;
use common::types::RecordSnapshot;
use profiler::format::{group_thousands, usd};
use profiler::persona_classification::PersonaTag;
use profiler::record_source::RemoteRecordSource;
use profiler::{report, FeatureRecord, ProfileError, ProfilerContext};
use std::fmt::Write as _;
use std::path::Path;

const USAGE: &str = "usage: profiler <analyze|stats|fetch> <address> [--simple] [--json] [--html]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Analyze {
        address: String,
        detailed: bool,
        json: bool,
        html: bool,
    },
    Stats {
        address: String,
    },
    Fetch {
        address: String,
    },
}

pub fn parse_args<I>(mut args: I) -> std::result::Result<Command, String>
where
    I: Iterator<Item = String>,
{
    // Drop argv[0].
    let _ = args.next();

    let cmd = args.next().ok_or_else(|| USAGE.to_string())?;
    let mut address = None;
    let mut detailed = true;
    let mut json = false;
    let mut html = false;
    for arg in args {
        match arg.as_str() {
            "--simple" => detailed = false,
            "--json" => json = true,
            "--html" => html = true,
            flag if flag.starts_with("--") => return Err(format!("unknown flag: {flag}")),
            _ if address.is_none() => address = Some(arg),
            _ => return Err(format!("unexpected argument: {arg}")),
        }
    }
    let address = address.ok_or_else(|| USAGE.to_string())?;

    match cmd.as_str() {
        "analyze" => Ok(Command::Analyze {
            address,
            detailed,
            json,
            html,
        }),
        "stats" => Ok(Command::Stats { address }),
        "fetch" => Ok(Command::Fetch { address }),
        other => Err(format!("unknown command: {other}")),
    }
}

pub async fn run_command<R: RemoteRecordSource>(
    ctx: &ProfilerContext<R>,
    output_dir: &Path,
    cmd: Command,
) -> Result<()> {
    match cmd {
        Command::Analyze {
            address,
            detailed,
            json,
            html,
        } => analyze(ctx, output_dir, &address, detailed, json, html).await,
        Command::Stats { address } => match ctx.profile(&address).await {
            Ok(record) => {
                print!("{}", format_stats(&record));
                Ok(())
            }
            Err(e) => report_missing(e, &address),
        },
        Command::Fetch { address } => match ctx.fetch_remote(&address).await {
            Ok(snapshot) => {
                print!("{}", format_fetch_summary(&address, &snapshot));
                Ok(())
            }
            Err(ProfileError::Upstream { reason, .. }) => {
                println!("Remote fetch failed for wallet {address}: {reason}");
                Ok(())
            }
            Err(e) => Err(e.into()),
        },
    }
}

async fn analyze<R: RemoteRecordSource>(
    ctx: &ProfilerContext<R>,
    output_dir: &Path,
    address: &str,
    detailed: bool,
    json: bool,
    html: bool,
) -> Result<()> {
    let record = match ctx.profile(address).await {
        Ok(record) => record,
        Err(e) => return report_missing(e, address),
    };
    let narrative = ctx.narrate(&record, detailed).await;

    println!("{narrative}\n");
    let md = report::write_markdown(output_dir, &record, &narrative)?;
    println!("Persona written to {}", md.display());
    if json {
        let path = report::write_json(output_dir, &record.clone().with_narrative(narrative.clone()))?;
        println!("Feature record written to {}", path.display());
    }
    if html {
        let path = report::write_html_report(output_dir, &record, &narrative)?;
        println!("HTML report written to {}", path.display());
    }
    Ok(())
}

/// Unknown wallets are an expected outcome on the command line, not a failure.
fn report_missing(err: ProfileError, address: &str) -> Result<()> {
    if err.is_not_found() {
        println!("No data found for wallet {address}");
        return Ok(());
    }
    Err(err.into())
}

pub fn format_stats(record: &FeatureRecord) -> String {
    let f = &record.features;
    let tags: Vec<&str> = record.classifications.iter().map(PersonaTag::as_str).collect();
    let mut out = String::new();
    let _ = writeln!(out, "Wallet: {}  ({})", f.address, f.social_handle);
    let _ = writeln!(out, "  chain            {}", f.chain);
    let _ = writeln!(out, "  net worth        {}", usd(f.total_networth));
    let _ = writeln!(out, "  native balance   {}", group_thousands(f.native_balance, 4));
    let _ = writeln!(out, "  token balance    {}", usd(f.token_balance_usd));
    let _ = writeln!(out, "  token ratio      {:.2}", f.token_ratio);
    let _ = writeln!(out, "  health score     {:.1}", f.wallet_health_score);
    let _ = writeln!(out, "  risk score       {:.1}", f.risk_score);
    let _ = writeln!(out, "  activity score   {}", f.activity_score);
    let _ = writeln!(out, "  tokens held      {}", f.token_count);
    let _ = writeln!(out, "  top tokens       {}", f.top_tokens.join(", "));
    let _ = writeln!(out, "  defi protocols   {}", f.defi_protocols);
    let _ = writeln!(out, "  defi value       {}", usd(f.total_defi_usd));
    let _ = writeln!(out, "  nft collections  {}", f.unique_nft_collections);
    let _ = writeln!(out, "  tags             {}", tags.join(", "));
    out
}

pub fn format_fetch_summary(address: &str, snapshot: &RecordSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Remote data for wallet {address}:");
    match snapshot.networth_for(address) {
        Some(row) => {
            let _ = writeln!(
                out,
                "  net worth        {}",
                usd(row.total_networth_usd.unwrap_or(0.0))
            );
        }
        None => {
            let _ = writeln!(out, "  net worth        n/a");
        }
    }
    let tokens: Vec<String> = snapshot
        .tokens_for(address)
        .map(|t| {
            format!(
                "{} ({})",
                t.token_symbol.as_deref().unwrap_or("?"),
                usd(t.usd_value.unwrap_or(0.0))
            )
        })
        .collect();
    let _ = writeln!(out, "  tokens           {}", tokens.len());
    for token in tokens {
        let _ = writeln!(out, "    {token}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::types::{NetWorthRow, TokenBalanceRow};
    use profiler::wallet_features::extract_wallet_features;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|s| (*s).to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn test_parse_analyze_defaults() {
        let cmd = parse_args(args(&["profiler", "analyze", "0xabc"])).unwrap();
        assert_eq!(
            cmd,
            Command::Analyze {
                address: "0xabc".to_string(),
                detailed: true,
                json: false,
                html: false,
            }
        );
    }

    #[test]
    fn test_parse_analyze_flags_any_position() {
        let cmd =
            parse_args(args(&["profiler", "analyze", "--simple", "0xabc", "--json", "--html"]))
                .unwrap();
        assert_eq!(
            cmd,
            Command::Analyze {
                address: "0xabc".to_string(),
                detailed: false,
                json: true,
                html: true,
            }
        );
    }

    #[test]
    fn test_parse_stats_and_fetch() {
        assert_eq!(
            parse_args(args(&["profiler", "stats", "0x1"])).unwrap(),
            Command::Stats {
                address: "0x1".to_string()
            }
        );
        assert_eq!(
            parse_args(args(&["profiler", "fetch", "0x2"])).unwrap(),
            Command::Fetch {
                address: "0x2".to_string()
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_args(args(&["profiler"])).is_err());
        assert!(parse_args(args(&["profiler", "analyze"])).is_err());
        assert!(parse_args(args(&["profiler", "explode", "0x1"])).is_err());
        assert!(parse_args(args(&["profiler", "stats", "0x1", "--verbose"])).is_err());
        assert!(parse_args(args(&["profiler", "stats", "0x1", "0x2"])).is_err());
    }

    fn snapshot() -> RecordSnapshot {
        RecordSnapshot {
            networth: vec![NetWorthRow {
                wallet: "0xcli".to_string(),
                chain: Some("eth".to_string()),
                total_networth_usd: Some(2_500.0),
                ..Default::default()
            }],
            tokens: vec![TokenBalanceRow {
                wallet: "0xcli".to_string(),
                token_symbol: Some("USDC".to_string()),
                usd_value: Some(1_000.0),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_format_stats() {
        let record = FeatureRecord::new(extract_wallet_features("0xcli", &snapshot()));
        let out = format_stats(&record);
        assert!(out.starts_with("Wallet: 0xcli"));
        assert!(out.contains("net worth        $2,500.00"));
        assert!(out.contains("top tokens       USDC"));
        assert!(out.contains("tags             retail_user"));
    }

    #[test]
    fn test_format_fetch_summary() {
        let out = format_fetch_summary("0xcli", &snapshot());
        assert!(out.contains("net worth        $2,500.00"));
        assert!(out.contains("tokens           1"));
        assert!(out.contains("USDC ($1,000.00)"));
        assert!(format_fetch_summary("0xnone", &snapshot()).contains("n/a"));
    }
}

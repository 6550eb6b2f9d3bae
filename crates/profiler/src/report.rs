//! HTML, Markdown and JSON renderings of a profiled wallet.

use anyhow::Context;
use askama::Template;
use chrono::Utc;
use common::types::parse_lenient_f64;
use std::path::{Path, PathBuf};

use crate::error::{ProfileError, Result};
use crate::format::{group_thousands, usd};
use crate::persona_classification::PersonaTag;
use crate::profile::FeatureRecord;
use crate::recommendations::Recommendation;

/// One line of the key-metrics table. `value` is the display text; `raw` is the exact
/// number (shortest round-trip form) carried in the row's `data-value` attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricRow {
    pub label: &'static str,
    pub value: String,
    pub raw: String,
}

impl MetricRow {
    fn money(label: &'static str, value: f64) -> Self {
        Self {
            label,
            value: usd(value),
            raw: value.to_string(),
        }
    }

    fn number(label: &'static str, value: f64, decimals: usize) -> Self {
        Self {
            label,
            value: group_thousands(value, decimals),
            raw: value.to_string(),
        }
    }

    fn count(label: &'static str, value: u64) -> Self {
        Self {
            label,
            value: value.to_string(),
            raw: value.to_string(),
        }
    }
}

pub fn metric_rows(record: &FeatureRecord) -> Vec<MetricRow> {
    let f = &record.features;
    vec![
        MetricRow::money("Total Net Worth", f.total_networth),
        MetricRow::number("Native Balance", f.native_balance, 4),
        MetricRow::money("Token Balance", f.token_balance_usd),
        MetricRow::number("Wallet Health Score", f.wallet_health_score, 1),
        MetricRow::number("Risk Score", f.risk_score, 1),
        MetricRow::count("Activity Score", f.activity_score),
        MetricRow::count("Transactions", f.transactions_total),
        MetricRow::count("Token Transfers", f.token_transfers_total),
        MetricRow::count("NFT Transfers", f.nft_transfers_total),
        MetricRow::count("Token Count", u64::from(f.token_count)),
        MetricRow::count("DeFi Protocols", u64::from(f.defi_protocols)),
        MetricRow::money("Total DeFi Value", f.total_defi_usd),
        MetricRow::count("NFT Collections", f.unique_nft_collections),
    ]
}

#[derive(Template)]
#[template(path = "report.html")]
struct ReportTemplate<'a> {
    address: &'a str,
    handle: &'a str,
    chain: &'a str,
    tags: Vec<&'static str>,
    metrics: Vec<MetricRow>,
    recommendations: Vec<&'static str>,
    narrative: &'a str,
    generated_at: String,
}

pub fn render_html_report(record: &FeatureRecord, narrative: &str) -> Result<String> {
    let f = &record.features;
    let template = ReportTemplate {
        address: &f.address,
        handle: &f.social_handle,
        chain: &f.chain,
        tags: record.classifications.iter().map(PersonaTag::as_str).collect(),
        metrics: metric_rows(record),
        recommendations: record.recommendations.iter().map(Recommendation::text).collect(),
        narrative,
        generated_at: Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    };
    template
        .render()
        .map_err(|e| ProfileError::Render(e.to_string()))
}

pub fn render_markdown(record: &FeatureRecord, narrative: &str) -> String {
    format!("# Wallet Persona for {}\n\n{narrative}\n", record.address())
}

fn file_stem(address: &str) -> String {
    address.chars().take(8).collect()
}

pub fn markdown_path(dir: &Path, address: &str) -> PathBuf {
    dir.join(format!("persona_{}.md", file_stem(address)))
}

pub fn json_path(dir: &Path, address: &str) -> PathBuf {
    dir.join(format!("persona_{}.json", file_stem(address)))
}

pub fn html_path(dir: &Path, address: &str) -> PathBuf {
    dir.join(format!("persona_report_{}.html", file_stem(address)))
}

fn write_file(path: &Path, contents: &str) -> Result<PathBuf> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir {}", parent.display()))?;
    }
    std::fs::write(path, contents).with_context(|| format!("write {}", path.display()))?;
    tracing::info!(path = %path.display(), "report written");
    Ok(path.to_path_buf())
}

pub fn write_markdown(dir: &Path, record: &FeatureRecord, narrative: &str) -> Result<PathBuf> {
    write_file(
        &markdown_path(dir, record.address()),
        &render_markdown(record, narrative),
    )
}

pub fn write_json(dir: &Path, record: &FeatureRecord) -> Result<PathBuf> {
    let json = serde_json::to_string_pretty(record).context("serialize feature record")?;
    write_file(&json_path(dir, record.address()), &json)
}

pub fn write_html_report(dir: &Path, record: &FeatureRecord, narrative: &str) -> Result<PathBuf> {
    let html = render_html_report(record, narrative)?;
    write_file(&html_path(dir, record.address()), &html)
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = entity.strip_prefix('#')?;
            let n = match code.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse().ok()?,
            };
            char::from_u32(n)
        }
    }
}

/// Decode named and numeric (`&#60;`, `&#x3c;`) character references. Unknown
/// references are left as written.
pub fn unescape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail
            .find(';')
            .and_then(|semi| decode_entity(&tail[1..semi]).map(|c| (c, semi)));
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn cell_text(row: &str) -> impl Iterator<Item = String> + '_ {
    row.split("<td>").skip(1).map(|cell| {
        let end = cell.find("</td>").unwrap_or(cell.len());
        unescape_html(cell[..end].trim())
    })
}

fn data_value(row: &str) -> Option<f64> {
    const ATTR: &str = "data-value=\"";
    let open_tag = &row[..row.find('>')?];
    let start = open_tag.find(ATTR)? + ATTR.len();
    let len = open_tag[start..].find('"')?;
    unescape_html(&open_tag[start..start + len]).parse().ok()
}

/// Read the key-metrics table back as (label, number) pairs. The exact `data-value` is
/// preferred; rows without one fall back to the displayed cell. Rows with no numeric
/// value are skipped.
pub fn parse_metrics_table(html: &str) -> Vec<(String, f64)> {
    let Some(start) = html.find("<table class=\"metrics\">") else {
        return Vec::new();
    };
    let table = &html[start..];
    let table = &table[..table.find("</table>").unwrap_or(table.len())];

    table
        .split("<tr")
        .skip(1)
        .filter_map(|row| {
            let mut cells = cell_text(row);
            let label = cells.next()?;
            let value =
                data_value(row).or_else(|| parse_lenient_f64(cells.next().as_deref()))?;
            Some((label, value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet_features::tests::blank_features;
    use crate::wallet_features::WalletFeatures;

    fn sample_record() -> FeatureRecord {
        FeatureRecord::new(WalletFeatures {
            total_networth: 1_234_567.89,
            native_balance: 12.3456,
            token_balance_usd: 45_000.5,
            chain: "eth".to_string(),
            wallet_health_score: 84.2,
            risk_score: 17.9,
            activity_score: 3_210,
            transactions_total: 3_000,
            token_transfers_total: 200,
            nft_transfers_total: 10,
            token_count: 7,
            defi_protocols: 2,
            total_defi_usd: 9_999.99,
            unique_nft_collections: 3,
            ..blank_features("0xfeedface00112233")
        })
    }

    #[test]
    fn test_metric_rows_format() {
        let rows = metric_rows(&sample_record());
        assert_eq!(rows.len(), 13);
        assert_eq!(rows[0].value, "$1,234,567.89");
        assert_eq!(rows[0].raw, "1234567.89");
        assert_eq!(rows[1].value, "12.3456");
        assert_eq!(rows[3].value, "84.2");
        assert_eq!(rows[6].value, "3000");
    }

    #[test]
    fn test_html_metrics_round_trip() {
        let record = sample_record();
        let html = render_html_report(&record, "A cautious whale.").unwrap();
        let parsed = parse_metrics_table(&html);
        let f = &record.features;
        let expected = [
            ("Total Net Worth", f.total_networth),
            ("Native Balance", f.native_balance),
            ("Token Balance", f.token_balance_usd),
            ("Wallet Health Score", f.wallet_health_score),
            ("Risk Score", f.risk_score),
            ("Activity Score", 3_210.0),
            ("Transactions", 3_000.0),
            ("Token Transfers", 200.0),
            ("NFT Transfers", 10.0),
            ("Token Count", 7.0),
            ("DeFi Protocols", 2.0),
            ("Total DeFi Value", f.total_defi_usd),
            ("NFT Collections", 3.0),
        ];
        assert_eq!(parsed.len(), expected.len());
        for ((label, value), (want_label, want)) in parsed.iter().zip(expected) {
            assert_eq!(label, want_label);
            assert!((value - want).abs() < 1e-9, "{label}: {value} != {want}");
        }
    }

    #[test]
    fn test_round_trip_keeps_full_precision() {
        let record = FeatureRecord::new(WalletFeatures {
            total_networth: 1_520.123_456,
            native_balance: 0.512_345_678,
            token_balance_usd: 20.456_789,
            total_defi_usd: 0.1 + 0.2,
            ..blank_features("0xprecise0000")
        });
        let html = render_html_report(&record, "narrative").unwrap();
        assert!(html.contains("<td>$1,520.12</td>"));

        let parsed = parse_metrics_table(&html);
        let get = |label: &str| {
            parsed
                .iter()
                .find(|(l, _)| l == label)
                .map(|(_, v)| *v)
                .unwrap()
        };
        let f = &record.features;
        assert_eq!(get("Total Net Worth").to_bits(), f.total_networth.to_bits());
        assert_eq!(get("Native Balance").to_bits(), f.native_balance.to_bits());
        assert_eq!(get("Token Balance").to_bits(), f.token_balance_usd.to_bits());
        assert_eq!(get("Total DeFi Value").to_bits(), f.total_defi_usd.to_bits());
        assert_eq!(get("Risk Score").to_bits(), f.risk_score.to_bits());
    }

    #[test]
    fn test_parse_falls_back_to_display_cell() {
        let html = "<table class=\"metrics\">\n<tr><th>Metric</th><th>Value</th></tr>\n\
                    <tr><td>Total Net Worth</td><td>$1,234.50</td></tr>\n\
                    <tr><td>Chain</td><td>eth</td></tr>\n</table>";
        assert_eq!(
            parse_metrics_table(html),
            vec![("Total Net Worth".to_string(), 1_234.5)]
        );
    }

    #[test]
    fn test_html_escapes_narrative() {
        let html = render_html_report(&sample_record(), "<script>alert(1)</script>").unwrap();
        assert!(!html.contains("<script>"));
        assert!(html.contains("whale"));

        let open = "<pre class=\"narrative\">";
        let start = html.find(open).unwrap() + open.len();
        let end = start + html[start..].find("</pre>").unwrap();
        assert_eq!(unescape_html(&html[start..end]), "<script>alert(1)</script>");
    }

    #[test]
    fn test_unescape_numeric_and_named_entities() {
        assert_eq!(unescape_html("&#60;b&#62; &#38; &#x27;q&#39;"), "<b> & 'q'");
        assert_eq!(unescape_html("&lt;i&gt; &amp;amp; &quot;"), "<i> &amp; \"");
        assert_eq!(unescape_html("AT&T &bogus; 5 & 6"), "AT&T &bogus; 5 & 6");
    }

    #[test]
    fn test_parse_without_table() {
        assert!(parse_metrics_table("<html></html>").is_empty());
    }

    #[test]
    fn test_markdown_and_paths() {
        let record = sample_record();
        let md = render_markdown(&record, "Body text");
        assert!(md.starts_with("# Wallet Persona for 0xfeedface00112233\n\nBody text"));

        let dir = Path::new("/tmp/out");
        assert_eq!(markdown_path(dir, "0xfeedface0011"), dir.join("persona_0xfeedfa.md"));
        assert_eq!(json_path(dir, "0xab"), dir.join("persona_0xab.json"));
        assert_eq!(
            html_path(dir, "0xfeedface0011"),
            dir.join("persona_report_0xfeedfa.html")
        );
    }

    #[test]
    fn test_write_files() {
        let tmp = tempfile::tempdir().unwrap();
        let record = sample_record();
        let md = write_markdown(tmp.path(), &record, "narrative").unwrap();
        let json = write_json(tmp.path(), &record).unwrap();
        let html = write_html_report(tmp.path(), &record, "narrative").unwrap();

        assert!(std::fs::read_to_string(md).unwrap().contains("narrative"));
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(json).unwrap()).unwrap();
        assert_eq!(value["address"], "0xfeedface00112233");
        assert_eq!(value["classifications"][0], "whale");
        assert!(std::fs::read_to_string(html).unwrap().contains("Key Metrics"));
    }
}

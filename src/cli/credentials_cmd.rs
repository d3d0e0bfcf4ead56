use anyhow::Result;
use console::style;
use serde_json::json;

use super::Session;
use super::output::print_json;
use crate::core::credentials::CredentialSource;
use crate::core::terminal::{GuideSection, print_success, print_warn};

pub(crate) fn source_label(source: CredentialSource) -> &'static str {
    match source {
        CredentialSource::Runtime => "saved",
        CredentialSource::BuildTime => "build-time default",
        CredentialSource::Missing => "not configured",
    }
}

pub(crate) fn show(session: &Session) -> Result<()> {
    let source = session.credentials.source();
    let current = session.credentials.get();

    if session.json {
        return print_json(&json!({
            "configured": current.is_some(),
            "source": source_label(source),
            "url": current.as_ref().map(|c| c.url.clone()),
            "token": current.as_ref().map(|c| c.masked_token()),
        }));
    }

    match current {
        Some(creds) => {
            GuideSection::new("Turso credentials")
                .status("URL", &creds.url)
                .status("Token", &creds.masked_token())
                .status("Source", source_label(source))
                .print();
            println!();
        }
        None => {
            print_warn("No Turso credentials configured.");
            println!(
                "  Run {} to connect a database.\n",
                style("mission-control setup").cyan()
            );
        }
    }
    Ok(())
}

pub(crate) fn clear(session: &Session) -> Result<()> {
    session.credentials.clear()?;
    if session.json {
        return print_json(&json!({
            "cleared": true,
            "source": source_label(session.credentials.source()),
        }));
    }
    print_success("Saved credentials removed.");
    if session.credentials.source() == CredentialSource::BuildTime {
        print_warn("Build-time defaults are still in effect.");
    }
    Ok(())
}

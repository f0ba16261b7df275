use std::fmt::{self, Display, Write as _};

use client_core::ClickerSnapshot;

pub const CONNECT_BUTTON: &str = "[ Connect Wallet ]";
pub const GAS_BUTTON: &str = "[ Gas! ]";
pub const PROCESSING_BUTTON: &str = "[ Processing... ]";
pub const OWNER_BADGE: &str = "🎯 You are connected as the owner wallet";

/// Renders the clicker panel for the current snapshot.
pub fn render(snapshot: &ClickerSnapshot) -> String {
    let mut out = String::new();
    let Some(account) = snapshot.account else {
        let _ = writeln!(out, "{CONNECT_BUTTON}");
        return out;
    };

    let _ = writeln!(out, "Connected: {account}");
    if let Some(owner) = snapshot.counters.contract_owner {
        let _ = writeln!(out, "Contract Owner: {owner}");
    }
    if snapshot.counters.is_caller_owner {
        let _ = writeln!(out, "{OWNER_BADGE}");
    }
    let _ = writeln!(out, "Total Clicks: {}", snapshot.counters.total_clicks);

    let button = if snapshot.transaction.pending {
        PROCESSING_BUTTON
    } else {
        GAS_BUTTON
    };
    let _ = writeln!(out, "{button}");

    if let Some(message) = &snapshot.transaction.last_success_message {
        let _ = writeln!(out, "{message}");
    }
    out
}

/// A blocking notice shown for failed user actions.
pub struct Alert<'a>(pub &'a dyn Display);

impl Display for Alert<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "⚠ {}", self.0)
    }
}

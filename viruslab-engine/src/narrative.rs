//! Fixed narrative lines shown in the terminal log.

pub const DEPLOYED: &str = "Unit deployed. Syncing to network...";
pub const INSUFFICIENT_FUNDS: &str = "Insufficient funds for deployment.";
pub const RECALLED: &str = "Unit recalled to base station.";
pub const MUTATING: &str = "ANOMALY DETECTED: Virus strain mutating unstable!";
pub const FIREWALL_BYPASSED: &str = "Unknown entity bypassed firewall protocols.";
pub const MUTATION_CONTAINED: &str = "DEFENSE SUCCESS: Mutation contained.";
pub const ATTACK_CONFIRMED: &str = "ATTACK CONFIRMED: Virus compromised extraction.";

/// Informational lines for the offline loop.
pub const SIGNAL_CHATTER: [&str; 5] = [
    "Processing neural handshake...",
    "Signal intercepted from Sector 7...",
    "Downloading virus schematics...",
    "Brute forcing private key...",
    "Packet loss detected in rendering engine...",
];

/// Warning lines layered over ledger data by the drama loop.
pub const LEDGER_CHATTER: [&str; 5] = [
    "Firewall integrity fluctuating...",
    "Unauthorized scan detected on relay node...",
    "Virus signature drifting from baseline...",
    "Latency spike across Sector 7 uplink...",
    "Encrypted burst traced to unknown origin...",
];

pub fn unit_disconnected(unit: u32) -> String {
    format!("CRITICAL FAILURE: Agent unit 0x{unit:x} disconnected.")
}

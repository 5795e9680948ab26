//! Stock content of the demo terminal: files, canned command output, and the intro script.

use crate::terminal::typewriter::{TypewriterItem, TypewriterTiming};

pub const TYPING_NORMAL_MS: u64 = 40;
pub const TYPING_FAST_MS: u64 = 25;
pub const LINE_DELAY_MS: u64 = 200;
pub const COMMAND_DELAY_MS: u64 = 400;
pub const CHROME_DELAY_MS: u64 = 100;
/// Pause before each scripted command starts typing.
pub const SCRIPT_COMMAND_PRE_DELAY_MS: u64 = 600;

pub const STOCK_TIMING: TypewriterTiming = TypewriterTiming {
    char_delay_ms: TYPING_NORMAL_MS,
    line_delay_ms: LINE_DELAY_MS,
    command_delay_ms: COMMAND_DELAY_MS,
};

pub const MISSION_TXT: &str = "Point Labs Mission Statement
============================

The future of AI is open, verifiable, and owned by everyone.

We believe that transformative AI should not be controlled by a handful
of corporations. Our mission is to build the infrastructure that makes
decentralized, privacy-preserving AI not just possible, but inevitable.

Core Focus Areas:
- Zero-knowledge machine learning (ZKML)
- Decentralized inference networks
- On-chain autonomous agents
- Open-source research and tooling

We ship code. We publish research. We build in public.";

pub const VALUES_TXT: &str = "Point Labs Core Values
======================

1. RESEARCH FIRST
   Every product decision is grounded in rigorous research.
   We publish our findings, even when inconvenient.

2. RADICAL TRANSPARENCY
   Open source by default. Open research by default.
   Our code, our methods, our reasoning: all public.

3. LONG-TERM THINKING
   We optimize for decades, not quarters.
   The infrastructure we build must outlast us.

4. TECHNICAL EXCELLENCE
   No shortcuts. No hype. Ship working code that scales.
   Complexity is the enemy; simplicity is the goal.

5. DECENTRALIZATION AS PRINCIPLE
   Not just a feature. A fundamental design constraint.
   Power must be distributed, not concentrated.";

pub const SYSTEM_JSON: &str = r#"{
  "name": "pointlabs-terminal",
  "version": "0.3.1",
  "build": "2024.12.001",
  "network": {
    "status": "operational",
    "nodes": 47,
    "latency_ms": 12,
    "uptime": "99.97%"
  },
  "features": {
    "zkml": true,
    "federated": "beta",
    "agents": "alpha"
  }
}"#;

pub const NETWORK_STATUS: &str = "Network Status: OPERATIONAL
━━━━━━━━━━━━━━━━━━━━━━━━━━━
Active Nodes     47
Avg Latency      12ms
Uptime           99.97%
━━━━━━━━━━━━━━━━━━━━━━━━━━━
ZKML Proofs      1,247,892
Inferences/day   89,421
Active Agents    156";

pub const VERSION_OUTPUT: &str = "pointlabs v0.3.1 (build 2024.12.001)
Protocol: zkml-v2
Network: mainnet-beta";

pub const GIT_LOG_OUTPUT: &str = "a3f7c21 feat: add cross-chain agent routing
b8e4d92 fix: zkml proof verification edge case
c1a5f30 docs: update protocol specification
d9b2e14 refactor: optimize inference batching
e4c8a67 feat: federated learning coordinator";

pub const HELP_OUTPUT: &str = "Available commands:

  cat <file>              Display file contents
  ls [dir]                List directory contents
  help                    Show this help message
  clear                   Clear terminal
  echo [text]             Print text
  pwd                     Print working directory
  pointlabs --version     Show version info
  pointlabs network status Show network statistics
  git log --oneline -5    Show recent commits

Files available:
  mission.txt    values.txt
  .config/system.json";

pub const MOTTO: &str = "\"The future of AI is open, verifiable, and owned by everyone.\"";

pub const SUGGESTED_COMMANDS: [&str; 4] = ["cat values.txt", "clear", "help", "ls"];

/// The intro played before the terminal accepts input.
pub fn intro_sequence() -> Vec<TypewriterItem> {
    vec![
        TypewriterItem::command("pointlabs --version").with_pre_delay(SCRIPT_COMMAND_PRE_DELAY_MS),
        TypewriterItem::output(VERSION_OUTPUT).with_char_delay(TYPING_FAST_MS),
        TypewriterItem::command(format!("echo {MOTTO}"))
            .with_pre_delay(SCRIPT_COMMAND_PRE_DELAY_MS),
        TypewriterItem::output(MOTTO).with_char_delay(TYPING_FAST_MS),
    ]
}

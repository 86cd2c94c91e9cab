//! Peers command (show an upstream).

use anyhow::Result;
use clap::Args;
use nasg_nginx::{Peer, UpstreamKind, UpstreamRef};
use tabled::Tabled;

use crate::output::{cell, print_info, print_output, OutputFormat};

use super::CommandContext;

/// Peers command - list the servers NGINX Plus has in an upstream.
#[derive(Debug, Args)]
pub struct PeersCommand {
    /// Upstream name.
    #[arg(long)]
    upstream: String,

    /// Upstream kind (http or stream).
    #[arg(long, default_value = "http")]
    kind: UpstreamKind,
}

#[derive(Debug, Tabled)]
struct PeerRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Server")]
    server: String,
    #[tabled(rename = "State")]
    state: String,
}

impl From<&Peer> for PeerRow {
    fn from(p: &Peer) -> Self {
        Self {
            id: cell(p.id),
            server: p.server.clone(),
            state: cell(p.state.as_deref()),
        }
    }
}

impl PeersCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let nginx = ctx.nginx()?;
        let upstream = UpstreamRef::new(self.kind, self.upstream);

        let peers = nginx.peers(&upstream).await?;

        if ctx.format == OutputFormat::Table {
            print_info(&format!("{} has {} peers", upstream, peers.len()));
        }
        let rows: Vec<PeerRow> = peers.peers.iter().map(PeerRow::from).collect();
        print_output(&peers, &rows, ctx.format);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Debug, Parser)]
    struct Harness {
        #[command(flatten)]
        peers: PeersCommand,
    }

    #[test]
    fn test_kind_parsing() {
        let h = Harness::try_parse_from(["peers", "--upstream", "backend1"]).unwrap();
        assert_eq!(h.peers.kind, UpstreamKind::Http);

        let h = Harness::try_parse_from(["peers", "--upstream", "tcp-backend", "--kind", "stream"])
            .unwrap();
        assert_eq!(h.peers.kind, UpstreamKind::Stream);

        assert!(Harness::try_parse_from(["peers", "--upstream", "x", "--kind", "udp"]).is_err());
    }

    #[test]
    fn test_peer_row() {
        let row = PeerRow::from(&Peer::new(7, "10.0.0.7:80"));
        assert_eq!(row.id, "7");
        assert_eq!(row.server, "10.0.0.7:80");
        assert_eq!(row.state, "up");
    }
}

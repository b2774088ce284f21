use publisher_config::{ConnectionMap, ConnectionStore};

use crate::cli::OutputFormat;
use crate::client::CliResult;
use crate::output::{render_connection, render_connection_list};

pub(crate) fn handle_connections_list(
    store: &ConnectionStore,
    format: OutputFormat,
) -> CliResult<()> {
    let redacted: ConnectionMap = store
        .list()?
        .into_iter()
        .map(|(name, connection)| (name, connection.redacted()))
        .collect();
    render_connection_list(&redacted, format)
}

pub(crate) fn handle_connections_show(
    store: &ConnectionStore,
    name: &str,
    format: OutputFormat,
) -> CliResult<()> {
    let connection = store.get(name)?.redacted();
    render_connection(name, &connection, format)
}

//! Output renderers and formatting helpers for CLI commands.

use anyhow::anyhow;
use publisher_auth::ServerUser;
use publisher_config::{Connection, ConnectionMap};
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::client::{CliError, CliResult};

fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
    println!("{text}");
    Ok(())
}

pub(crate) fn render_connection_list(
    connections: &ConnectionMap,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(connections)?,
        OutputFormat::Table => {
            println!("{:<20} {:<24} {:<16} USER", "NAME", "ACCOUNT", "AUTHENTICATOR");
            for (name, connection) in connections {
                println!(
                    "{:<20} {:<24} {:<16} {}",
                    name,
                    connection.account,
                    display_or_dash(&connection.authenticator),
                    display_or_dash(&connection.user)
                );
            }
        }
    }
    Ok(())
}

pub(crate) fn render_connection(
    name: &str,
    connection: &Connection,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(connection)?,
        OutputFormat::Table => {
            println!("name: {name}");
            println!("account: {}", display_or_dash(&connection.account));
            println!("user: {}", display_or_dash(&connection.user));
            println!(
                "authenticator: {}",
                display_or_dash(&connection.authenticator)
            );
            if let Some(file) = &connection.private_key_file {
                println!("private_key_file: {file}");
            }
            if let Some(token) = &connection.token {
                println!("token: {token}");
            }
            if let Some(role) = &connection.role {
                println!("role: {role}");
            }
        }
    }
    Ok(())
}

pub(crate) fn render_user(user: &ServerUser, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(user)?,
        OutputFormat::Table => {
            println!("username: {}", user.username);
            if !user.email.is_empty() {
                println!("email: {}", user.email);
            }
            println!("role: {}", user.user_role);
        }
    }
    Ok(())
}

fn display_or_dash(value: &str) -> &str {
    if value.is_empty() { "-" } else { value }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_fields_render_as_dash() {
        assert_eq!(display_or_dash(""), "-");
        assert_eq!(display_or_dash("acme"), "acme");
    }

    #[test]
    fn renderers_accept_both_formats() {
        let connection = Connection {
            account: "acme".to_string(),
            authenticator: "oauth".to_string(),
            token: Some("********".to_string()),
            ..Connection::default()
        };
        let mut map = ConnectionMap::new();
        map.insert("prod".to_string(), connection.clone());
        for format in [OutputFormat::Table, OutputFormat::Json] {
            assert!(render_connection_list(&map, format).is_ok());
            assert!(render_connection("prod", &connection, format).is_ok());
            assert!(render_user(&ServerUser::default(), format).is_ok());
        }
    }
}

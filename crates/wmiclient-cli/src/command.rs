//! Maps parsed subcommands onto client calls.

use wmiclient::{ClientError, ErrorPolicy, Transport, WmiClient};

use crate::cli::{CliCommand, ProcessAction, QueryAction, RegistryAction, ServiceAction};
use crate::output::Outcome;

/// Runs `command` against `client`.
pub(crate) fn dispatch<T: Transport>(
    client: &mut WmiClient<T>,
    command: &CliCommand,
) -> Result<Outcome, ClientError> {
    match command {
        CliCommand::Service { action } => service(client, action).map(Outcome::Result),
        CliCommand::Registry { action } => registry(client, action).map(Outcome::Result),
        CliCommand::Process { action } => match action {
            ProcessAction::Create { command: line } => client.process_create(line),
            ProcessAction::Status { pid } => client.process_status(*pid),
        }
        .map(Outcome::Result),
        CliCommand::Query { action } => query(client, *action),
        CliCommand::Raw { args } => {
            let borrowed: Vec<&str> = args.iter().map(String::as_str).collect();
            client.request(&borrowed).map(Outcome::Result)
        }
    }
}

fn service<T: Transport>(
    client: &mut WmiClient<T>,
    action: &ServiceAction,
) -> Result<wmiclient::RequestResult, ClientError> {
    match action {
        ServiceAction::Start { name } => client.service_start(name),
        ServiceAction::Stop { name } => client.service_stop(name),
        ServiceAction::Status { name } => client.service_query(name),
    }
}

fn registry<T: Transport>(
    client: &mut WmiClient<T>,
    action: &RegistryAction,
) -> Result<wmiclient::RequestResult, ClientError> {
    match action {
        RegistryAction::Get { path, key, raw } => {
            let policy = if *raw {
                ErrorPolicy::ReturnRaw
            } else {
                ErrorPolicy::Raise
            };
            client.registry_get_key(path, key, policy)
        }
        RegistryAction::Set { path, key, values } => {
            let borrowed: Vec<&str> = values.iter().map(String::as_str).collect();
            client.registry_set_key(path, key, &borrowed)
        }
        RegistryAction::Create { path, key } => client.registry_create_key(path, key),
    }
}

fn query<T: Transport>(
    client: &mut WmiClient<T>,
    action: QueryAction,
) -> Result<Outcome, ClientError> {
    match action {
        QueryAction::Uuid => client
            .query_uuid()
            .map(|(result, uuid)| Outcome::Uuid { result, uuid }),
        QueryAction::Network => client
            .query_network()
            .map(|(result, interfaces)| Outcome::Network { result, interfaces }),
    }
}

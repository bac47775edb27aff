//! CLI commands

use anyhow::{Result, bail};
use clap::{Subcommand, ValueEnum};
use leasedesk_http::types::{
    Contract, ContractUpdate, Person, PersonKind, PersonUpdate, Property, PropertyKind,
    PropertyUpdate, Reference, RegisterRequest,
};
use leasedesk_http::LeaseClient;
use serde::Serialize;
use std::time::Duration;
use tracing::info;

/// How often `keepalive` checks that the session is still alive
const SESSION_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and keep the session for later commands
    Login {
        #[arg(long)]
        email: String,

        #[arg(long, env = "LEASEDESK_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create an account and log in with it
    Register {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        #[arg(long, env = "LEASEDESK_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget the stored session
    Logout,

    /// Show the logged-in user's profile
    Whoami,

    /// Manage people (landlords and tenants)
    People {
        #[command(subcommand)]
        command: PeopleCommands,
    },

    /// Manage properties
    Properties {
        #[command(subcommand)]
        command: PropertyCommands,
    },

    /// Manage rental contracts
    Contracts {
        #[command(subcommand)]
        command: ContractCommands,
    },

    /// Keep the stored session alive until interrupted
    Keepalive,
}

#[derive(Subcommand)]
pub enum PeopleCommands {
    List,
    Get {
        id: String,
    },
    Create {
        #[arg(long, value_enum)]
        kind: PersonKindArg,
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        document: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
    },
    /// Change selected fields of a person
    Update {
        id: String,
        #[arg(long, value_enum)]
        kind: Option<PersonKindArg>,
        #[arg(long)]
        full_name: Option<String>,
        #[arg(long)]
        document: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    Delete {
        id: String,
    },
    /// Mark a person inactive
    Deactivate {
        id: String,
    },
}

#[derive(Subcommand)]
pub enum PropertyCommands {
    List,
    Get {
        id: String,
    },
    Create {
        #[arg(long, value_enum)]
        kind: PropertyKindArg,
        #[arg(long)]
        description: String,
        #[arg(long)]
        location: String,
        #[arg(long, default_value_t = 0.0)]
        hectares: f64,
    },
    /// Change selected fields of a property
    Update {
        id: String,
        #[arg(long, value_enum)]
        kind: Option<PropertyKindArg>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        hectares: Option<f64>,
    },
    Delete {
        id: String,
    },
}

#[derive(Subcommand)]
pub enum ContractCommands {
    List,
    Get {
        id: String,
    },
    Create {
        #[arg(long)]
        contract_type: String,
        /// Landlord id
        #[arg(long)]
        lessor: String,
        /// Tenant id
        #[arg(long)]
        lessee: String,
        /// Property id
        #[arg(long)]
        property: String,
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: String,
        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end: String,
        #[arg(long)]
        amount: f64,
    },
    /// Change selected fields of a contract
    Update {
        id: String,
        #[arg(long)]
        contract_type: Option<String>,
        #[arg(long)]
        lessor: Option<String>,
        #[arg(long)]
        lessee: Option<String>,
        #[arg(long)]
        property: Option<String>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        #[arg(long)]
        amount: Option<f64>,
    },
    Delete {
        id: String,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum PersonKindArg {
    Individual,
    Company,
}

impl From<PersonKindArg> for PersonKind {
    fn from(kind: PersonKindArg) -> Self {
        match kind {
            PersonKindArg::Individual => Self::Individual,
            PersonKindArg::Company => Self::Company,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum PropertyKindArg {
    House,
    Farm,
}

impl From<PropertyKindArg> for PropertyKind {
    fn from(kind: PropertyKindArg) -> Self {
        match kind {
            PropertyKindArg::House => Self::House,
            PropertyKindArg::Farm => Self::Farm,
        }
    }
}

impl Commands {
    /// Whether the command runs until interrupted
    pub const fn is_long_running(&self) -> bool {
        matches!(self, Self::Keepalive)
    }

    pub async fn execute(self, client: LeaseClient) -> Result<()> {
        match self {
            Self::Login { email, password } => {
                let user = client.login(email, password).await?;
                print_json(&user)
            }
            Self::Register {
                name,
                email,
                password,
            } => {
                let user = client
                    .register(&RegisterRequest {
                        name,
                        email,
                        password,
                    })
                    .await?;
                print_json(&user)
            }
            Self::Logout => {
                client.logout()?;
                Ok(())
            }
            Self::Whoami => {
                if !client.is_authenticated() {
                    bail!("Not logged in; run `leasedesk login` first");
                }
                print_json(&client.profile().await?)
            }
            Self::People { command } => command.execute(&client).await,
            Self::Properties { command } => command.execute(&client).await,
            Self::Contracts { command } => command.execute(&client).await,
            Self::Keepalive => keepalive(&client).await,
        }
    }
}

impl PeopleCommands {
    async fn execute(self, client: &LeaseClient) -> Result<()> {
        match self {
            Self::List => print_json(&client.list_people().await?),
            Self::Get { id } => print_json(&client.get_person(&id).await?),
            Self::Create {
                kind,
                full_name,
                document,
                email,
                phone,
            } => {
                let person = Person {
                    id: None,
                    kind: kind.into(),
                    full_name,
                    document,
                    email,
                    phone,
                };
                print_json(&client.create_person(&person).await?)
            }
            Self::Update {
                id,
                kind,
                full_name,
                document,
                email,
                phone,
            } => {
                let update = PersonUpdate {
                    kind: kind.map(Into::into),
                    full_name,
                    document,
                    email,
                    phone,
                };
                if update == PersonUpdate::default() {
                    bail!("Nothing to update; pass at least one field");
                }
                print_json(&client.update_person(&id, &update).await?)
            }
            Self::Delete { id } => {
                client.delete_person(&id).await?;
                info!(%id, "Person deleted");
                Ok(())
            }
            Self::Deactivate { id } => print_json(&client.deactivate_person(&id).await?),
        }
    }
}

impl PropertyCommands {
    async fn execute(self, client: &LeaseClient) -> Result<()> {
        match self {
            Self::List => print_json(&client.list_properties().await?),
            Self::Get { id } => print_json(&client.get_property(&id).await?),
            Self::Create {
                kind,
                description,
                location,
                hectares,
            } => {
                let property = Property {
                    id: None,
                    kind: kind.into(),
                    description,
                    location,
                    hectares,
                };
                print_json(&client.create_property(&property).await?)
            }
            Self::Update {
                id,
                kind,
                description,
                location,
                hectares,
            } => {
                let update = PropertyUpdate {
                    kind: kind.map(Into::into),
                    description,
                    location,
                    hectares,
                };
                if update == PropertyUpdate::default() {
                    bail!("Nothing to update; pass at least one field");
                }
                print_json(&client.update_property(&id, &update).await?)
            }
            Self::Delete { id } => {
                client.delete_property(&id).await?;
                info!(%id, "Property deleted");
                Ok(())
            }
        }
    }
}

impl ContractCommands {
    async fn execute(self, client: &LeaseClient) -> Result<()> {
        match self {
            Self::List => print_json(&client.list_contracts().await?),
            Self::Get { id } => print_json(&client.get_contract(&id).await?),
            Self::Create {
                contract_type,
                lessor,
                lessee,
                property,
                start,
                end,
                amount,
            } => {
                let contract = Contract {
                    id: None,
                    contract_type,
                    lessor: Reference::Id(lessor),
                    lessee: Reference::Id(lessee),
                    property: Reference::Id(property),
                    start_date: start,
                    end_date: end,
                    amount,
                    created_by: None,
                };
                print_json(&client.create_contract(&contract).await?)
            }
            Self::Update {
                id,
                contract_type,
                lessor,
                lessee,
                property,
                start,
                end,
                amount,
            } => {
                let update = ContractUpdate {
                    contract_type,
                    lessor,
                    lessee,
                    property,
                    start_date: start,
                    end_date: end,
                    amount,
                };
                if update == ContractUpdate::default() {
                    bail!("Nothing to update; pass at least one field");
                }
                print_json(&client.update_contract(&id, &update).await?)
            }
            Self::Delete { id } => {
                client.delete_contract(&id).await?;
                info!(%id, "Contract deleted");
                Ok(())
            }
        }
    }
}

async fn keepalive(client: &LeaseClient) -> Result<()> {
    let Some(user) = client.restore()? else {
        bail!("No stored session; run `leasedesk login` first");
    };
    info!(user = %user.email, "Keeping session alive; press Ctrl-C to stop");

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut poll = tokio::time::interval(SESSION_POLL_INTERVAL);
    loop {
        tokio::select! {
            signal = &mut ctrl_c => {
                signal?;
                client.stop_auto_refresh();
                info!("Stopped");
                return Ok(());
            }
            _ = poll.tick() => {
                if !client.is_auto_refreshing() {
                    bail!("Session ended; run `leasedesk login` to sign in again");
                }
            }
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

//! Telegram bot.
//!
//! The bot is a thin client: it talks only to the HTTP server API and never
//! accesses the database directly. Purchases that need money go through
//! Telegram Stars invoices; confirmed payments come back as
//! `successful_payment` updates and are forwarded to the server for
//! reconciliation.

use base64::Engine;
use reqwest::{Client, header};
use teloxide::prelude::*;

mod api;
mod handlers;
mod state;
mod ui;

#[derive(Clone)]
pub struct ConfigParameters {
    admin_users: Vec<UserId>,
    required_channels: Vec<String>,
    api: api::ApiClient,
    sessions: state::SessionStore,
}

pub struct Bot {
    token: String,
    admin_users: Vec<UserId>,
    required_channels: Vec<String>,
    server: String,
    client: Client,
}

impl Bot {
    pub fn new(
        token: &str,
        admin_users: Vec<UserId>,
        required_channels: Vec<String>,
        server: &str,
        username: &str,
        password: &str,
    ) -> Result<Self, String> {
        // Basic authorization is in the form "Basic `secret`" where `secret` is
        // the base64 of the string "username:password".
        let secret = format!("{username}:{password}");
        let secret = format!("Basic {}", base64::prelude::BASE64_STANDARD.encode(secret));

        let mut auth = header::HeaderValue::try_from(secret)
            .map_err(|err| format!("invalid auth header value: {err}"))?;
        auth.set_sensitive(true);

        let mut headers = header::HeaderMap::new();
        headers.insert(header::AUTHORIZATION, auth);

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|err| format!("failed to build http client: {err}"))?;

        Ok(Self {
            token: token.to_string(),
            admin_users,
            required_channels,
            server: server.to_string(),
            client,
        })
    }

    pub fn builder() -> BotBuilder {
        BotBuilder::default()
    }

    pub async fn run(&self) {
        tracing::info!("Starting telegram bot...");

        let bot = teloxide::Bot::new(&self.token);

        let parameters = ConfigParameters {
            admin_users: self.admin_users.clone(),
            required_channels: self.required_channels.clone(),
            api: api::ApiClient::new(self.client.clone(), self.server.clone()),
            sessions: state::SessionStore::default(),
        };

        let handler = dptree::entry()
            .branch(Update::filter_message().endpoint(handlers::handle_message))
            .branch(Update::filter_callback_query().endpoint(handlers::handle_callback))
            .branch(Update::filter_pre_checkout_query().endpoint(handlers::handle_pre_checkout));

        Dispatcher::builder(bot, handler)
            .dependencies(dptree::deps![parameters])
            .default_handler(|upd| async move {
                tracing::warn!("Unhandled update: {:?}", upd);
            })
            .error_handler(LoggingErrorHandler::with_custom_text(
                "An error has occurred in the dispatcher",
            ))
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    }
}

#[derive(Default, Debug)]
pub struct BotBuilder {
    token: String,
    admin_users: Vec<UserId>,
    required_channels: Vec<String>,
    server: String,
    username: String,
    password: String,
}

impl BotBuilder {
    pub fn token(mut self, token: &str) -> BotBuilder {
        self.token = token.to_string();
        self
    }

    pub fn admin_users(mut self, admin_users: Vec<u64>) -> BotBuilder {
        self.admin_users = admin_users.into_iter().map(UserId).collect();
        self
    }

    /// Channel usernames users must be subscribed to before the bot serves
    /// them content.
    pub fn required_channels(mut self, channels: Vec<String>) -> BotBuilder {
        self.required_channels = channels;
        self
    }

    pub fn server(mut self, server: &str, username: &str, password: &str) -> BotBuilder {
        self.server = server.to_string();
        self.username = username.to_string();
        self.password = password.to_string();
        self
    }

    pub fn build(self) -> Result<Bot, String> {
        tracing::info!("Initializing telegram bot...");
        Bot::new(
            &self.token,
            self.admin_users,
            self.required_channels,
            &self.server,
            &self.username,
            &self.password,
        )
    }
}

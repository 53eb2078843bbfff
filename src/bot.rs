use crate::config::AppConfig;
use crate::format::format_company;
use crate::logger::Logger;
use crate::normalize::normalize_text;
use crate::registry::RegistryClient;
use crate::store::Store;
use crate::telegram::{Message, TelegramClient};
use regex::Regex;
use std::sync::{Arc, LazyLock};

/// A bare CNPJ is 14 digits once the usual punctuation is stripped.
static CNPJ_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]{14}$").unwrap());

const USAGE: &str = "🤖 Bot CNPJ Online!\n\nUse:\n/cnpj 00000000000100\n/cidade santo andre";
const USAGE_CNPJ: &str = "Use: /cnpj 00000000000100";
const USAGE_CIDADE: &str = "Use: /cidade santo andre";
const NOT_FOUND: &str = "❌ CNPJ não encontrado.";
const NO_MORE_COMPANIES: &str = "⚠️ Nenhuma empresa disponível.";
const NONE_FOUND: &str = "⚠️ Nenhuma empresa encontrada.";
const ACCESS_DENIED: &str = "⛔ Acesso não autorizado.";
const INTERNAL_ERROR: &str = "❌ Erro interno ao buscar empresas.";
const RESULT_SEPARATOR: &str = "-----------------\n";

/// Stateless command dispatcher: each update is parsed, gated, answered.
pub struct Dispatcher {
    registry: RegistryClient,
    store: Store,
    logger: Arc<Logger>,
    city_limit: u32,
    require_authorization: bool,
}

/// `/cnpj 12.345.678/0001-90` and `/cnpj@SomeBot 12345678000190` both parse.
fn parse_command(text: &str) -> Option<(&str, Vec<&str>)> {
    let mut parts = text.split_whitespace();
    let head = parts.next()?;
    if !head.starts_with('/') {
        return None;
    }
    let command = head.split('@').next().unwrap_or(head);
    Some((command, parts.collect()))
}

/// Drop the punctuation people paste along with a CNPJ.
fn clean_cnpj(raw: &str) -> String {
    raw.chars().filter(|c| !matches!(c, '.' | '/' | '-')).collect()
}

/// Capitalize each word for the listing header: "santo andre" → "Santo Andre".
fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(|c| c.to_lowercase()))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

impl Dispatcher {
    pub fn new(
        config: &AppConfig,
        registry: RegistryClient,
        store: Store,
        logger: Arc<Logger>,
    ) -> Self {
        Self {
            registry,
            store,
            logger,
            city_limit: config.city_result_limit,
            require_authorization: config.require_authorization,
        }
    }

    /// Handle one incoming message end to end: gate, dispatch, reply.
    /// Send failures are logged; nothing here takes the process down.
    pub async fn handle_message(&self, telegram: &TelegramClient, message: &Message) {
        let Some(text) = message.text.as_deref() else {
            return;
        };
        // Plain chatter (no leading slash) gets no reply
        if !text.starts_with('/') {
            return;
        }

        let user_id = message.from.as_ref().map(|u| u.id).unwrap_or(0);

        let reply = if self.require_authorization && !self.caller_is_authorized(user_id).await {
            let _ = self.logger.log_command(text, user_id, "denied");
            ACCESS_DENIED.to_string()
        } else {
            self.build_reply(user_id, text).await
        };

        if let Err(e) = telegram.send_message(message.chat.id, &reply).await {
            let _ = self.logger.log_error(&format!("reply to chat {} failed: {e}", message.chat.id));
        }
    }

    async fn caller_is_authorized(&self, user_id: i64) -> bool {
        match self.store.is_authorized(user_id).await {
            Ok(authorized) => authorized,
            Err(e) => {
                let _ = self.logger.log_error(&format!("authorization check failed: {e}"));
                false
            }
        }
    }

    /// Produce the reply text for one command. Always returns something to
    /// send — backend failures collapse to a friendly error line.
    pub async fn build_reply(&self, user_id: i64, text: &str) -> String {
        let Some((command, args)) = parse_command(text) else {
            return USAGE.to_string();
        };

        match command {
            "/start" | "/help" => {
                let _ = self.logger.log_command(command, user_id, "usage");
                USAGE.to_string()
            }
            "/cnpj" => self.lookup_cnpj(user_id, &args).await,
            "/cidade" => self.lookup_city(user_id, &args).await,
            _ => {
                let _ = self.logger.log_command(command, user_id, "unknown");
                USAGE.to_string()
            }
        }
    }

    async fn lookup_cnpj(&self, user_id: i64, args: &[&str]) -> String {
        let [raw] = args else {
            let _ = self.logger.log_command("/cnpj", user_id, "bad args");
            return USAGE_CNPJ.to_string();
        };

        let cnpj = clean_cnpj(raw);
        if !CNPJ_RE.is_match(&cnpj) {
            let _ = self.logger.log_command("/cnpj", user_id, "invalid cnpj");
            return USAGE_CNPJ.to_string();
        }

        match self.registry.fetch_company(&cnpj, &self.logger).await {
            Some(record) => {
                let _ = self.logger.log_command("/cnpj", user_id, "found");
                format_company(&record)
            }
            None => {
                let _ = self.logger.log_command("/cnpj", user_id, "not found");
                NOT_FOUND.to_string()
            }
        }
    }

    /// Pop up to `city_limit` stubs for the city, fetch detail per stub and
    /// format whatever the registry still knows. Stubs whose detail fetch
    /// fails are skipped; the pool has already consumed them either way.
    async fn lookup_city(&self, user_id: i64, args: &[&str]) -> String {
        if args.is_empty() {
            let _ = self.logger.log_command("/cidade", user_id, "bad args");
            return USAGE_CIDADE.to_string();
        }

        let city_input = args.join(" ");
        let city_key = normalize_text(&city_input);

        let stubs = match self.store.pop_stubs_for_city(&city_key, self.city_limit).await {
            Ok(stubs) => stubs,
            Err(e) => {
                let _ = self.logger.log_error(&format!("pop for city '{city_key}' failed: {e}"));
                return INTERNAL_ERROR.to_string();
            }
        };

        if stubs.is_empty() {
            let _ = self.logger.log_command("/cidade", user_id, "exhausted");
            return NO_MORE_COMPANIES.to_string();
        }

        let mut reply = format!("🏙️ Empresas em {}:\n\n", title_case(&city_input));
        let mut found = 0;

        for stub in &stubs {
            if let Some(record) = self.registry.fetch_company(&stub.cnpj, &self.logger).await {
                reply.push_str(&format_company(&record));
                reply.push_str(RESULT_SEPARATOR);
                found += 1;
            }
        }

        let _ = self.logger.log_command(
            "/cidade",
            user_id,
            &format!("{found}/{} formatted", stubs.len()),
        );

        if found == 0 {
            return NONE_FOUND.to_string();
        }
        reply
    }
}

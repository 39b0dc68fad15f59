pub mod callback;
pub mod general_message;
pub mod message;

use std::sync::Arc;
use teloxide::{
    dispatching::{dialogue, UpdateHandler},
    prelude::*,
};

use crate::bot::state::WizardStore;
use crate::database::connection::DatabaseManager;
use crate::services::transport::ChatTransport;

pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

pub struct BotHandler {
    pub db: DatabaseManager,
    transport: Arc<dyn ChatTransport>,
    wizard: Arc<WizardStore>,
}

impl BotHandler {
    pub fn new(db: DatabaseManager, transport: Arc<dyn ChatTransport>) -> Self {
        Self {
            db,
            transport,
            wizard: Arc::new(WizardStore::new()),
        }
    }

    pub fn schema(&self) -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
        use teloxide::dispatching::UpdateFilterExt;

        let db_command = self.db.clone();
        let transport_command = self.transport.clone();
        let db_callback = self.db.clone();
        let transport_callback = self.transport.clone();
        let wizard_callback = self.wizard.clone();
        let db_wizard = self.db.clone();
        let wizard_message = self.wizard.clone();

        dialogue::enter::<Update, teloxide::dispatching::dialogue::InMemStorage<()>, (), _>()
            .branch(
                Update::filter_message()
                    .filter_command::<crate::bot::commands::Command>()
                    .endpoint(move |bot, msg, cmd| {
                        let db = db_command.clone();
                        let transport = transport_command.clone();
                        async move { message::command_handler(bot, msg, cmd, db, transport).await }
                    }),
            )
            .branch(Update::filter_callback_query().endpoint(move |bot, q| {
                let db = db_callback.clone();
                let transport = transport_callback.clone();
                let wizard = wizard_callback.clone();
                async move { callback::callback_handler(bot, q, db, transport, wizard).await }
            }))
            .branch(Update::filter_message().endpoint(move |bot, msg| {
                let db = db_wizard.clone();
                let wizard = wizard_message.clone();
                async move { general_message::wizard_message_handler(bot, msg, db, wizard).await }
            }))
    }
}

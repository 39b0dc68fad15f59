use teloxide::utils::command::BotCommands;

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Volley Poll Bot commands:")]
pub enum Command {
    #[command(description = "Display this help message")]
    Help,
    #[command(description = "Start the bot and show the menu")]
    Start,
    #[command(description = "Show your Telegram user id")]
    GetId,
    #[command(description = "Post due polls right now (admins only)")]
    PollNow,
}

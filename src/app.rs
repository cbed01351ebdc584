use crate::client::RecommendClient;
use crate::config::Config;
use crate::tui::{self, EventHandler, InputEvent, Tui};
use crate::ui::chat::ChatManager;
use crate::ui::chat::manager::ChatAction;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyModifiers};

/// Run the chat TUI until the user exits.
pub async fn run(config: Config, client: RecommendClient) -> Result<()> {
    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run_loop(&mut terminal, config, client).await;
    tui::restore()?;
    result
}

async fn run_loop(terminal: &mut Tui, config: Config, client: RecommendClient) -> Result<()> {
    let mut manager = ChatManager::new(&config, client);
    let mut events = EventHandler::new();

    loop {
        terminal.draw(|frame| {
            let area = frame.size();
            manager.render(area, frame.buffer_mut());
        })?;

        match events.next().await {
            Some(InputEvent::Key(key)) => {
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
                {
                    break;
                }

                if manager.handle_key(key).await? == ChatAction::Exit {
                    break;
                }
            }
            Some(InputEvent::Tick) => {
                manager.process_completions();
            }
            Some(InputEvent::Resize(_, _)) => {}
            None => break,
        }
    }

    Ok(())
}

//! Terminal session driving the composition workflow end to end.

use crate::cli::{Cli, Commands};
use anyhow::Result;
use dialoguer::{Confirm, Input, Select};
use omaggio::clipboard::OsClipboard;
use omaggio::mail::{self, MailIntent};
use omaggio::playback::SpeechPlayer;
use omaggio::providers::GeminiStudio;
use omaggio::workflow::{Engine, EngineSettings, Services, WorkflowEvent};
use omaggio::{Config, Language};
use std::sync::Arc;

pub async fn dispatch(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Compose { language, prompt } => compose(language, prompt, config).await,
        Commands::Mail {
            category,
            recurring,
            language,
            dry_run,
        } => open_commission(&category, recurring, language, dry_run, &config),
    }
}

fn build_engine(config: &Config) -> Engine {
    let studio = Arc::new(GeminiStudio::new(config));
    let services = Services {
        composer: studio.clone(),
        renderer: studio.clone(),
        synthesizer: studio,
        player: default_player(),
        clipboard: Arc::new(OsClipboard),
    };
    Engine::new(services, EngineSettings::from_config(config))
}

#[cfg(feature = "playback")]
fn default_player() -> Arc<dyn SpeechPlayer> {
    Arc::new(omaggio::playback::CpalPlayer::new())
}

#[cfg(not(feature = "playback"))]
fn default_player() -> Arc<dyn SpeechPlayer> {
    Arc::new(omaggio::playback::NoopPlayer)
}

async fn compose(
    language: Option<Language>,
    prompt: Option<String>,
    mut config: Config,
) -> Result<()> {
    if let Some(lang) = language {
        config.language = lang;
    }
    let locale = config.language.code();
    let mut engine = build_engine(&config);

    // Consent gate. One-way for the session; --prompt implies consent.
    println!("◆ {}", t!("atelier.consent_title", locale = locale));
    println!("  {}", t!("atelier.consent_desc", locale = locale));
    if prompt.is_none() {
        let agreed = Confirm::new()
            .with_prompt(t!("atelier.consent_btn", locale = locale).to_string())
            .default(true)
            .interact()?;
        if !agreed {
            return Ok(());
        }
    }
    engine.dispatch(WorkflowEvent::ConsentGranted);

    if let Some(text) = prompt {
        run_composition(&mut engine, text, locale).await;
        return Ok(());
    }

    println!("\n◆ {}", t!("atelier.title", locale = locale));
    println!("  {}", t!("atelier.subtitle", locale = locale));

    loop {
        let input: String = Input::new()
            .with_prompt(t!("atelier.placeholder", locale = locale).to_string())
            .allow_empty(true)
            .interact_text()?;
        if input.trim().is_empty() {
            break;
        }
        run_composition(&mut engine, input, locale).await;
        if !action_menu(&mut engine, locale).await? {
            break;
        }
    }
    Ok(())
}

async fn run_composition(engine: &mut Engine, text: String, locale: &str) {
    engine.dispatch(WorkflowEvent::PromptSubmitted { text });
    if !engine.state().is_composing() {
        return;
    }
    println!("› {}", t!("atelier.loading", locale = locale));
    engine.wait_until(|state| !state.is_composing()).await;

    println!("\n{}", t!("atelier.result", locale = locale));
    if let Some(draft) = engine.state().draft_text.as_deref() {
        println!("{draft}\n");
    }
}

/// Post-composition actions. Returns false when the session should end.
async fn action_menu(engine: &mut Engine, locale: &str) -> Result<bool> {
    loop {
        // the recurring offer appears shortly after a successful draft
        if !engine.state().recurring_prompt_visible {
            let visible = tokio::time::timeout(
                std::time::Duration::from_secs(2),
                engine.wait_until(|state| state.recurring_prompt_visible),
            )
            .await;
            if visible.is_ok() {
                println!("◆ {}", t!("atelier.recurring_title", locale = locale));
                println!("  {}", t!("atelier.recurring_desc", locale = locale));
            }
        }

        let mut items: Vec<String> = vec![
            t!("atelier.listen", locale = locale).into_owned(),
            t!("atelier.copy", locale = locale).into_owned(),
            t!("atelier.generate_img", locale = locale).into_owned(),
            t!("atelier.commission", locale = locale).into_owned(),
        ];
        if engine.state().recurring_prompt_visible {
            items.push(t!("atelier.recurring_btn", locale = locale).into_owned());
        }
        items.push(t!("atelier.generate", locale = locale).into_owned());
        items.push("Exit".to_string());

        let choice = Select::new().items(&items).default(0).interact()?;
        let recurring_offered = engine.state().recurring_prompt_visible;

        match choice {
            0 => {
                engine.dispatch(WorkflowEvent::ListenRequested);
                engine
                    .wait_until(|state| !state.is_synthesizing_audio)
                    .await;
            }
            1 => {
                engine.dispatch(WorkflowEvent::CopyRequested);
                if engine.state().is_draft_copied {
                    println!("✓ {}", t!("atelier.copied", locale = locale));
                }
            }
            2 => {
                println!("› {}", t!("atelier.creating_img", locale = locale));
                engine.dispatch(WorkflowEvent::ImageRequested);
                engine.wait_until(|state| !state.is_rendering_image).await;
                if let Some(image) = engine.state().image.as_ref() {
                    println!("✓ {} ({} bytes base64)", image.mime_type, image.data.len());
                }
            }
            3 => engine.dispatch(WorkflowEvent::CommissionRequested),
            4 if recurring_offered => engine.dispatch(WorkflowEvent::RecurringRequested),
            n if n == items.len() - 2 => return Ok(true),
            _ => return Ok(false),
        }
    }
}

fn open_commission(
    category: &str,
    recurring: bool,
    language: Option<Language>,
    dry_run: bool,
    config: &Config,
) -> Result<()> {
    let language = language.unwrap_or(config.language);
    let intent = MailIntent {
        category: category.to_string(),
        recurring,
        draft: None,
    };
    let message = mail::build_mail_message(language, &intent);
    let uri = message.mailto_uri(&config.atelier_address);

    if dry_run {
        println!("{uri}");
    } else {
        mail::open_mail_client(&uri)?;
        println!("✓ {}", message.subject);
    }
    Ok(())
}

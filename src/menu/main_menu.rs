use crate::component::poster_generator::ffmpeg_command::{
    MAX_QUALITY, MAX_TARGET_HEIGHT, MIN_QUALITY, MIN_TARGET_HEIGHT,
};
use crate::config::save::save_settings;
use crate::config::types::{Config, Language};
use crate::menu::handlers::{run_poster_generator, show_tool_status};
use anyhow::Result;
use console::{Term, style};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Select};
use rust_i18n::t;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// 常用的海報高度
const HEIGHT_PRESETS: [u32; 4] = [480, 720, 1000, 1440];

pub fn show_main_menu(
    term: &Term,
    shutdown_signal: &Arc<AtomicBool>,
    config: &mut Config,
) -> Result<bool> {
    term.clear_screen()?;

    println!("{}", style(t!("main_menu.title")).cyan().bold());
    println!("{}", style(t!("common.esc_hint")).dim());

    let options = vec![
        t!("main_menu.opt_generate"),
        t!("main_menu.opt_tools"),
        t!("main_menu.opt_settings"),
        t!("main_menu.exit"),
    ];

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(t!("main_menu.prompt"))
        .items(&options)
        .default(0)
        .interact_on_opt(term)?;

    match selection {
        Some(0) => {
            run_poster_generator(term, shutdown_signal, config)?;
            Ok(true)
        }
        Some(1) => {
            show_tool_status(term, config)?;
            Ok(true)
        }
        Some(2) => {
            show_settings_menu(term, config)?;
            Ok(true)
        }
        Some(3) | None => Ok(false),
        _ => unreachable!(),
    }
}

/// 設定選單
fn show_settings_menu(term: &Term, config: &mut Config) -> Result<()> {
    loop {
        term.clear_screen()?;

        println!("{}", style(t!("settings.title")).cyan().bold());
        println!("{}", style(t!("common.esc_hint")).dim());

        let options = vec![
            t!("settings.opt_height"),
            t!("settings.opt_quality"),
            t!("settings.opt_language"),
            t!("settings.back"),
        ];

        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt(t!("settings.prompt"))
            .items(&options)
            .default(0)
            .interact_on_opt(term)?;

        match selection {
            Some(0) => show_height_menu(term, config)?,
            Some(1) => show_quality_menu(term, config)?,
            Some(2) => show_language_menu(term, config)?,
            Some(3) | None => break,
            _ => unreachable!(),
        }
    }

    Ok(())
}

fn show_height_menu(term: &Term, config: &mut Config) -> Result<()> {
    term.clear_screen()?;

    println!("{}", style(t!("settings.height.title")).cyan().bold());
    println!("{}", style(t!("common.esc_hint")).dim());
    println!(
        "\n{} {}px\n",
        style(t!("settings.current")).dim(),
        config.settings.poster_height
    );

    let mut items: Vec<String> = HEIGHT_PRESETS.iter().map(|h| format!("{h}px")).collect();
    items.push(t!("settings.height.custom").to_string());

    let default_index = HEIGHT_PRESETS
        .iter()
        .position(|&h| h == config.settings.poster_height)
        .unwrap_or(items.len() - 1);

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(t!("settings.height.prompt"))
        .items(&items)
        .default(default_index)
        .interact_on_opt(term)?;

    let Some(selection) = selection else {
        return Ok(());
    };

    let height = match HEIGHT_PRESETS.get(selection) {
        Some(&preset) => preset,
        None => Input::<u32>::with_theme(&ColorfulTheme::default())
            .with_prompt(t!(
                "settings.height.custom_prompt",
                min = MIN_TARGET_HEIGHT,
                max = MAX_TARGET_HEIGHT
            ))
            .default(config.settings.poster_height)
            .validate_with(|value: &u32| -> Result<(), String> {
                if (MIN_TARGET_HEIGHT..=MAX_TARGET_HEIGHT).contains(value) {
                    Ok(())
                } else {
                    Err(t!("settings.out_of_range").to_string())
                }
            })
            .interact_text_on(term)?,
    };

    if height != config.settings.poster_height {
        config.settings.poster_height = height;
        save_and_confirm(config, &format!("{height}px"))?;
    }

    Ok(())
}

fn show_quality_menu(term: &Term, config: &mut Config) -> Result<()> {
    term.clear_screen()?;

    println!("{}", style(t!("settings.quality.title")).cyan().bold());
    println!("{}", style(t!("settings.quality.hint")).dim());

    let quality = Input::<u8>::with_theme(&ColorfulTheme::default())
        .with_prompt(t!(
            "settings.quality.prompt",
            min = MIN_QUALITY,
            max = MAX_QUALITY
        ))
        .default(config.settings.poster_quality)
        .validate_with(|value: &u8| -> Result<(), String> {
            if (MIN_QUALITY..=MAX_QUALITY).contains(value) {
                Ok(())
            } else {
                Err(t!("settings.out_of_range").to_string())
            }
        })
        .interact_text_on(term)?;

    if quality != config.settings.poster_quality {
        config.settings.poster_quality = quality;
        save_and_confirm(config, &quality.to_string())?;
    }

    Ok(())
}

/// 語言設定選單
fn show_language_menu(term: &Term, config: &mut Config) -> Result<()> {
    term.clear_screen()?;

    println!("{}", style(t!("settings.language.title")).cyan().bold());
    println!("{}", style(t!("common.esc_hint")).dim());

    let languages = [Language::EnUs, Language::ZhTw];
    let items: Vec<String> = languages.iter().map(ToString::to_string).collect();

    let default_index = languages
        .iter()
        .position(|&l| l == config.settings.language)
        .unwrap_or(0);

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(t!("settings.language.prompt"))
        .items(&items)
        .default(default_index)
        .interact_on_opt(term)?;

    let Some(selection) = selection else {
        return Ok(());
    };

    let selected_lang = languages[selection];
    if selected_lang != config.settings.language {
        config.settings.language = selected_lang;
        rust_i18n::set_locale(selected_lang.as_str());
        save_and_confirm(config, &selected_lang.to_string())?;
    }

    Ok(())
}

fn save_and_confirm(config: &Config, value: &str) -> Result<()> {
    save_settings(&config.settings)?;
    println!("\n{} {value}", style(t!("settings.saved")).green());
    std::thread::sleep(std::time::Duration::from_secs(1));
    Ok(())
}

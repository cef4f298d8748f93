//! Command execution

use crate::config::ScenaConfig;
use crate::preview;
use crate::Command;
use anyhow::{Context, Result};
use scena_document::{Frame, SceneDocument, Session, TimeOfDay};
use std::io::{self, Write};
use std::path::Path;
use tracing::info;

pub fn run(command: Command, config: &ScenaConfig) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match command {
        Command::New { file, frames } => {
            let mut session = Session::with_easing(config.playback.easing);
            for _ in 0..frames {
                session.store_mut().add_frame();
            }
            session
                .save_as(&file)
                .with_context(|| format!("Failed to create {}", file.display()))?;
            writeln!(out, "created {} with {frames} frame(s)", file.display())?;
        }

        Command::Inspect { file } => {
            let session = open(&file, config)?;
            write_summary(session.document(), &mut out)?;
        }

        Command::Validate { file } => {
            let session = open(&file, config)?;
            writeln!(
                out,
                "{}: ok ({} frame(s))",
                file.display(),
                session.document().len()
            )?;
        }

        Command::Config => {
            write!(out, "{}", config.to_toml()?)?;
        }

        Command::AddFrame { file } => {
            let mut session = open(&file, config)?;
            let frame = session.store_mut().add_frame();
            session.store_mut().inherit_chapter(frame)?;
            save(&mut session)?;
            writeln!(out, "added frame {frame}")?;
        }

        Command::AddSprite { file, frame, image } => {
            let mut session = open(&file, config)?;
            let slot = session.store_mut().add_sprite(frame, image)?;
            save(&mut session)?;
            writeln!(out, "frame {frame}: added sprite {slot}")?;
        }

        Command::DuplicateSprite { file, frame, slot } => {
            let mut session = open(&file, config)?;
            let copy = session.store_mut().duplicate_sprite(frame, slot)?;
            save(&mut session)?;
            writeln!(out, "frame {frame}: sprite {slot} copied to {copy}")?;
        }

        Command::DeleteSprite { file, frame, slot } => {
            let mut session = open(&file, config)?;
            let removed = session.store_mut().delete_sprite(frame, slot)?;
            save(&mut session)?;
            writeln!(
                out,
                "frame {frame}: deleted sprite {slot} ({})",
                removed.element.image
            )?;
        }

        Command::ReorderSprites { file, frame, order } => {
            let mut session = open(&file, config)?;
            session.store_mut().reorder_sprites(frame, &order)?;
            save(&mut session)?;
            writeln!(out, "frame {frame}: reordered {} sprite(s)", order.len())?;
        }

        Command::Place {
            file,
            frame,
            element,
            image,
            position,
            scale,
        } => {
            let mut session = open(&file, config)?;
            let store = session.store_mut();
            if let Some(image) = image {
                store.set_image(frame, element, image)?;
            }
            if let Some(position) = position {
                store.set_rest_position(frame, element, position)?;
            }
            if let Some(scale) = scale {
                store.set_rest_scale(frame, element, scale)?;
            }
            save(&mut session)?;
        }

        Command::Animate {
            file,
            frame,
            element,
            off,
            duration,
            to,
            to_scale,
        } => {
            let mut session = open(&file, config)?;
            let store = session.store_mut();
            store.set_animation_enabled(frame, element, !off)?;
            if let Some(duration) = duration {
                store.set_animation_duration(frame, element, duration)?;
            }
            if let Some(to) = to {
                store.set_animation_target_position(frame, element, to)?;
            }
            if let Some(scale) = to_scale {
                store.set_animation_target_scale(frame, element, scale)?;
            }
            save(&mut session)?;
            let state = if off { "off" } else { "on" };
            writeln!(out, "frame {frame}: animation {state} for {element}")?;
        }

        Command::Text {
            file,
            frame,
            name,
            dialogue,
        } => {
            let mut session = open(&file, config)?;
            let store = session.store_mut();
            if let Some(name) = name {
                store.set_character_name(frame, name)?;
            }
            if let Some(dialogue) = dialogue {
                store.set_dialogue(frame, dialogue)?;
            }
            save(&mut session)?;
        }

        Command::Ui {
            file,
            frame,
            time,
            chapter,
            inherit_chapter,
            emotion,
            emotion_image,
            emotion_background,
            emotion_position,
            emotion_scale,
        } => {
            let mut session = open(&file, config)?;
            let store = session.store_mut();
            if let Some(time) = time {
                let time = TimeOfDay::from_label(&time)
                    .with_context(|| format!("Unknown time of day {time:?}"))?;
                store.set_time_of_day(frame, time)?;
            }
            if let Some(chapter) = chapter {
                store.set_chapter(frame, chapter)?;
            }
            if inherit_chapter {
                store.inherit_chapter(frame)?;
            }
            if let Some(enabled) = emotion {
                store.set_emotion_enabled(frame, enabled)?;
            }
            if let Some(image) = emotion_image {
                store.set_emotion_portrait(frame, image)?;
            }
            if let Some(image) = emotion_background {
                store.set_emotion_background(frame, image)?;
            }
            if let Some(position) = emotion_position {
                store.set_emotion_position(frame, position)?;
            }
            if let Some(scale) = emotion_scale {
                store.set_emotion_scale(frame, scale)?;
            }
            save(&mut session)?;
        }

        Command::Preview { file, frame, hz } => {
            let mut session = open(&file, config)?;
            session.select_frame(frame)?;
            let hz = hz.unwrap_or(config.playback.tick_hz);
            let report = preview::run(&mut session, hz, &mut out)?;
            info!(ticks = report.ticks, "preview complete");
        }
    }

    Ok(())
}

fn open(file: &Path, config: &ScenaConfig) -> Result<Session> {
    Session::load(file, config.playback.easing)
        .with_context(|| format!("Failed to open {}", file.display()))
}

/// Save only when the command changed something
fn save(session: &mut Session) -> Result<()> {
    if !session.is_dirty() {
        return Ok(());
    }
    session.save().context("Failed to save document")
}

fn write_summary<W: Write>(document: &SceneDocument, out: &mut W) -> Result<()> {
    writeln!(out, "{} frame(s)", document.len())?;
    for (index, frame) in document.frames().iter().enumerate() {
        write_frame(index, frame, out)?;
    }
    Ok(())
}

fn write_frame<W: Write>(index: usize, frame: &Frame, out: &mut W) -> Result<()> {
    let chapter = if frame.ui.chapter.is_empty() {
        "-"
    } else {
        frame.ui.chapter.as_str()
    };
    let time = match frame.ui.time_of_day {
        TimeOfDay::Unset => "-",
        other => other.as_str(),
    };
    writeln!(
        out,
        "frame {index}: chapter {chapter}, time {time}, {} sprite(s), {} animated",
        frame.sprites.count(),
        frame.animated_count()
    )?;

    let background = &frame.background;
    writeln!(
        out,
        "  background {:?} at ({}, {}) x({}, {})",
        background.image,
        background.rest.position.x,
        background.rest.position.y,
        background.rest.scale.x,
        background.rest.scale.y
    )?;
    for (slot, sprite) in frame.sprites.iter().enumerate() {
        let element = &sprite.element;
        write!(
            out,
            "  [{slot}] {} {:?} at ({}, {}) x({}, {})",
            sprite.label,
            element.image,
            element.rest.position.x,
            element.rest.position.y,
            element.rest.scale.x,
            element.rest.scale.y
        )?;
        if let Some(animation) = &element.animation {
            write!(
                out,
                " -> ({}, {}) over {}ms",
                animation.target.position.x, animation.target.position.y, animation.duration_ms
            )?;
        }
        writeln!(out)?;
    }
    if !frame.text.character_name.is_empty() || !frame.text.dialogue.is_empty() {
        writeln!(
            out,
            "  {}: {}",
            frame.text.character_name, frame.text.dialogue
        )?;
    }
    Ok(())
}

use chrono::Local;
use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};

use crate::{
    api::sunsynk::{Program, ProgramWrite},
    cli::ChargeArgs,
    core::{Dispatch, SlotSet, SlotWrite},
};

fn new_table() -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED).apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.enforce_styling();
    table
}

pub fn build_dispatches_table(dispatches: &[Dispatch]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Start", "End", "Duration"]);
    for dispatch in dispatches {
        let start = dispatch.start.with_timezone(&Local);
        let end = dispatch.end.with_timezone(&Local);
        table.add_row(vec![
            Cell::new(start.format("%a %H:%M")),
            Cell::new(end.format("%a %H:%M")).add_attribute(Attribute::Dim),
            Cell::new(format!("{} min", (dispatch.end - dispatch.start).num_minutes()))
                .set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

/// The planned slots, highlighting the ones to be written.
pub fn build_slots_table(slots: &SlotSet, writes: &[SlotWrite]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Slot", "Start", "End", "Duration", "Enabled", "Write"]);
    for slot in slots {
        let is_written = writes.iter().any(|write| write.index == slot.index);
        table.add_row(vec![
            Cell::new(slot.index + 1).add_attribute(Attribute::Dim),
            Cell::new(slot.start),
            Cell::new(slot.end).add_attribute(Attribute::Dim),
            Cell::new(format!("{} min", slot.duration())).set_alignment(CellAlignment::Right),
            if slot.is_enabled {
                Cell::new("yes").fg(Color::Green)
            } else {
                Cell::new("no").fg(Color::DarkYellow)
            },
            if is_written { Cell::new("✎").fg(Color::Red) } else { Cell::new("") },
        ]);
    }
    table
}

/// What is about to be sent to the inverter.
pub fn build_writes_table(writes: &[ProgramWrite], charge: ChargeArgs) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Program", "Start", "Charging", "Power", "Target SoC"]);
    for write in writes {
        let is_charging = write.transition.is_charging;
        let target_soc = charge.target_soc(is_charging);
        table.add_row(vec![
            Cell::new(write.index + 1),
            Cell::new(write.transition.start),
            if is_charging {
                Cell::new("yes").fg(Color::Green)
            } else {
                Cell::new("no").fg(Color::DarkYellow)
            },
            Cell::new(format!("{} W", charge.power_watts)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{target_soc}%")).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

pub fn build_programs_table(programs: &[Program]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Program", "Start", "Enabled", "Power", "Target SoC"]);
    for (index, program) in programs.iter().enumerate() {
        table.add_row(vec![
            Cell::new(index + 1).add_attribute(Attribute::Dim),
            Cell::new(program.start),
            if program.is_enabled {
                Cell::new("yes").fg(Color::Green)
            } else {
                Cell::new("no").fg(Color::DarkYellow)
            },
            Cell::new(format!("{} W", program.power_watts)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{}%", program.target_soc)).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

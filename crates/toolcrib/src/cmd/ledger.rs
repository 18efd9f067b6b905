//! toolcrib - Everyday ledger operations.
//!
//! # Usage
//!
//! ```bash
//! toolcrib tool add "Cordless drill" --category 1 --quantity 5
//! toolcrib tool adjust tool-1 8
//! toolcrib unit condition unit-4 fair --notes "chuck wobbles"
//! toolcrib borrow --borrower Ana --due 2024-03-05 --quantity tool-1=2 --unit tool-9=unit-31
//! toolcrib return loan-12 --condition good --unit unit-4=poor
//! toolcrib extend loan-12 2024-03-09 --reason "job ran long"
//! toolcrib material add Screws --quantity 500 --threshold 100 --unit pcs
//! toolcrib consume --consumer Ben --item mat-3=40 --price mat-3=0.05
//! toolcrib submit request.json
//! toolcrib loans --overdue
//! ```

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use toolcrib_core::{
    BorrowRequest, BorrowingTransaction, CategoryId, Condition, ConsumeRequest,
    ConsumptionTransaction, ExtendRequest, Material, MaterialId, NewMaterial, NewTool, Outcome,
    Request, ReturnRequest, Tool, ToolEdit, ToolId, ToolUnit, TransactionId, UnitId,
};
use toolcrib_engine::ToolDeletion;

use crate::cmd::common::{init_logging, parse_due, parse_pair, report_error, Session, StoreArgs};
use crate::cmd::completions::generate_completions;

/// Manage tools, loans and materials.
#[derive(Parser, Debug)]
#[command(name = "toolcrib")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    store: StoreArgs,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create, resize, edit and remove tools
    Tool {
        #[command(subcommand)]
        command: ToolCommand,
    },

    /// Inspect and maintain individual units
    Unit {
        #[command(subcommand)]
        command: UnitCommand,
    },

    /// Create and restock materials
    Material {
        #[command(subcommand)]
        command: MaterialCommand,
    },

    /// Lend tool units
    Borrow {
        /// Who takes the tools
        #[arg(long)]
        borrower: String,
        /// Due date (YYYY-MM-DD or RFC 3339)
        #[arg(long, value_parser = parse_due)]
        due: DateTime<Utc>,
        /// Why the tools are needed
        #[arg(long, default_value = "")]
        purpose: String,
        /// Lend this many units of a tool, picked by condition
        #[arg(long = "quantity", value_name = "TOOL=N", value_parser = parse_pair::<ToolId, u32>)]
        quantities: Vec<(ToolId, u32)>,
        /// Lend this exact unit
        #[arg(long = "unit", value_name = "TOOL=UNIT", value_parser = parse_pair::<ToolId, UnitId>)]
        units: Vec<(ToolId, UnitId)>,
    },

    /// Return every unit of a loan
    Return {
        /// The loan
        transaction: TransactionId,
        /// Condition for units not named with --unit
        #[arg(long)]
        condition: Option<Condition>,
        /// Condition of one unit
        #[arg(
            long = "unit",
            value_name = "UNIT=CONDITION",
            value_parser = parse_pair::<UnitId, Condition>
        )]
        units: Vec<(UnitId, Condition)>,
        /// Notes recorded on the loan
        #[arg(long)]
        notes: Option<String>,
    },

    /// Move a loan's due date
    Extend {
        /// The loan
        transaction: TransactionId,
        /// New due date (YYYY-MM-DD or RFC 3339)
        #[arg(value_parser = parse_due)]
        due: DateTime<Utc>,
        /// Why the loan is extended
        #[arg(long, default_value = "")]
        reason: String,
    },

    /// Take materials out of stock
    Consume {
        /// Who uses the materials
        #[arg(long)]
        consumer: String,
        /// What they are used for
        #[arg(long, default_value = "")]
        purpose: String,
        /// Project to charge
        #[arg(long)]
        project: Option<String>,
        /// Consume this quantity of a material
        #[arg(
            long = "item",
            value_name = "MATERIAL=QTY",
            value_parser = parse_pair::<MaterialId, Decimal>
        )]
        items: Vec<(MaterialId, Decimal)>,
        /// Unit price of a material
        #[arg(
            long = "price",
            value_name = "MATERIAL=PRICE",
            value_parser = parse_pair::<MaterialId, Decimal>
        )]
        prices: Vec<(MaterialId, Decimal)>,
    },

    /// Apply a borrow or consume request from a JSON file
    Submit {
        /// The request file
        file: PathBuf,
    },

    /// List loans (open ones by default)
    Loans {
        /// Only loans past their due date
        #[arg(long, conflicts_with = "all")]
        overdue: bool,
        /// Include returned loans
        #[arg(long)]
        all: bool,
    },

    /// Generate shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
enum ToolCommand {
    /// Create a tool and its units
    Add {
        /// Display name
        name: String,
        /// Category
        #[arg(long, default_value = "1")]
        category: CategoryId,
        /// Number of units
        #[arg(long, default_value_t = 1)]
        quantity: u32,
        /// Condition of the new units
        #[arg(long, default_value = "good")]
        condition: Condition,
        /// Storage location
        #[arg(long)]
        location: Option<String>,
        /// Supplier
        #[arg(long)]
        supplier: Option<String>,
    },

    /// Change a tool's descriptive fields
    Edit {
        /// The tool
        tool: ToolId,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New category
        #[arg(long)]
        category: Option<CategoryId>,
        /// New location
        #[arg(long)]
        location: Option<String>,
        /// New supplier
        #[arg(long)]
        supplier: Option<String>,
    },

    /// Set a tool's total quantity
    Adjust {
        /// The tool
        tool: ToolId,
        /// New total
        total: u32,
    },

    /// Delete a tool (archived if it has loan history)
    Delete {
        /// The tool
        tool: ToolId,
    },

    /// Show a tool with its units and open loans
    Show {
        /// The tool
        tool: ToolId,
    },

    /// List tools
    List,
}

#[derive(Subcommand, Debug)]
enum UnitCommand {
    /// Add units to a tool
    Add {
        /// The tool
        tool: ToolId,
        /// How many units
        count: u32,
        /// Condition of the new units (defaults to the configured replenish condition)
        #[arg(long)]
        condition: Option<Condition>,
    },

    /// Record a unit's condition
    Condition {
        /// The unit
        unit: UnitId,
        /// New condition
        condition: Condition,
        /// Replace the unit's notes
        #[arg(long)]
        notes: Option<String>,
    },

    /// List a tool's units
    List {
        /// The tool
        tool: ToolId,
        /// Only units that can be lent now
        #[arg(long)]
        available: bool,
    },
}

#[derive(Subcommand, Debug)]
enum MaterialCommand {
    /// Create a material
    Add {
        /// Display name
        name: String,
        /// Category
        #[arg(long, default_value = "1")]
        category: CategoryId,
        /// Opening stock
        #[arg(long, default_value = "0")]
        quantity: Decimal,
        /// Reorder level
        #[arg(long, default_value = "0")]
        threshold: Decimal,
        /// Unit of measure
        #[arg(long, default_value = "pcs")]
        unit: String,
    },

    /// Set a material's stock
    Update {
        /// The material
        material: MaterialId,
        /// New stock
        quantity: Decimal,
        /// New reorder level (unchanged if omitted)
        #[arg(long)]
        threshold: Option<Decimal>,
    },

    /// List materials
    List {
        /// Only materials at or below their reorder level
        #[arg(long)]
        low: bool,
    },

    /// List consumption history
    History,
}

/// Main entry point for the ledger command.
pub fn main() -> ExitCode {
    let args = Args::parse();

    if let Command::Completions { shell } = args.command {
        generate_completions::<Args>(shell, "toolcrib");
        return ExitCode::SUCCESS;
    }

    init_logging(args.store.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report_error(&e),
    }
}

fn run(args: &Args) -> Result<()> {
    let session = Session::open(&args.store)?;
    let mut stdout = io::stdout().lock();
    let changed = execute(&session, &args.command, args.json, &mut stdout)?;
    if changed {
        session.save()?;
    }
    Ok(())
}

/// Run one command. Returns whether the ledger changed.
fn execute<W: Write>(
    session: &Session,
    command: &Command,
    json: bool,
    out: &mut W,
) -> Result<bool> {
    let engine = &session.engine;
    match command {
        Command::Tool { command } => tool_command(session, command, json, out),
        Command::Unit { command } => unit_command(session, command, json, out),
        Command::Material { command } => material_command(session, command, json, out),

        Command::Borrow {
            borrower,
            due,
            purpose,
            quantities,
            units,
        } => {
            let request = borrow_request(borrower, *due, purpose, quantities, units);
            let loan = engine.borrow(request)?;
            let now = engine.now();
            emit(out, json, &loan, |out| write_loan(out, &loan, now))?;
            Ok(true)
        }

        Command::Return {
            transaction,
            condition,
            units,
            notes,
        } => {
            let loan = engine.transaction(*transaction)?;
            let request = return_request(&loan, *condition, units, notes.clone())?;
            let loan = engine.return_loan(request)?;
            let now = engine.now();
            emit(out, json, &loan, |out| write_loan(out, &loan, now))?;
            Ok(true)
        }

        Command::Extend {
            transaction,
            due,
            reason,
        } => {
            let due = engine.extend(ExtendRequest {
                transaction_id: *transaction,
                new_due_date: *due,
                reason: reason.clone(),
            })?;
            let value = json!({ "transaction_id": transaction, "due_date": due });
            emit(out, json, &value, |out| {
                writeln!(out, "{transaction} now due {}", due.format("%Y-%m-%d %H:%M"))
            })?;
            Ok(true)
        }

        Command::Consume {
            consumer,
            purpose,
            project,
            items,
            prices,
        } => {
            let request = consume_request(consumer, purpose, project.as_deref(), items, prices)?;
            let consumption = engine.consume(request)?;
            emit(out, json, &consumption, |out| write_consumption(out, &consumption))?;
            Ok(true)
        }

        Command::Submit { file } => {
            let text = fs::read_to_string(file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let request: Request = serde_json::from_str(&text)
                .with_context(|| format!("invalid request in {}", file.display()))?;
            let outcome = engine.submit(request)?;
            emit(out, json, &outcome, |out| match outcome {
                Outcome::Borrowed { transaction_id } => writeln!(out, "created {transaction_id}"),
                Outcome::Consumed { transaction_id } => writeln!(out, "recorded {transaction_id}"),
            })?;
            Ok(true)
        }

        Command::Loans { overdue, all } => {
            let loans = if *overdue {
                engine.overdue_transactions()?
            } else if *all {
                engine.transactions()?
            } else {
                engine.open_transactions()?
            };
            let now = engine.now();
            emit(out, json, &loans, |out| {
                loans.iter().try_for_each(|loan| write_loan(out, loan, now))
            })?;
            Ok(false)
        }

        // Handled before the ledger is opened.
        Command::Completions { .. } => Ok(false),
    }
}

fn tool_command<W: Write>(
    session: &Session,
    command: &ToolCommand,
    json: bool,
    out: &mut W,
) -> Result<bool> {
    let engine = &session.engine;
    match command {
        ToolCommand::Add {
            name,
            category,
            quantity,
            condition,
            location,
            supplier,
        } => {
            let mut new =
                NewTool::new(name.clone(), *category, *quantity).with_condition(*condition);
            new.location.clone_from(location);
            new.supplier.clone_from(supplier);
            let tool = engine.create_tool(new)?;
            emit(out, json, &tool, |out| write_tool(out, &tool))?;
            Ok(true)
        }

        ToolCommand::Edit {
            tool,
            name,
            category,
            location,
            supplier,
        } => {
            let edit = ToolEdit {
                name: name.clone(),
                category_id: *category,
                location: location.clone(),
                supplier: supplier.clone(),
            };
            let tool = engine.update_tool(*tool, edit)?;
            emit(out, json, &tool, |out| write_tool(out, &tool))?;
            Ok(true)
        }

        ToolCommand::Adjust { tool, total } => {
            let available = engine.adjust_quantity(*tool, *total)?;
            let value = json!({
                "tool_id": tool,
                "total_quantity": total,
                "available_quantity": available,
            });
            emit(out, json, &value, |out| {
                writeln!(out, "{tool}  {available}/{total} available")
            })?;
            Ok(true)
        }

        ToolCommand::Delete { tool } => {
            let deletion = engine.delete_tool(*tool)?;
            let verb = match deletion {
                ToolDeletion::Removed => "removed",
                ToolDeletion::Archived => "archived",
            };
            let value = json!({ "tool_id": tool, "deletion": verb });
            emit(out, json, &value, |out| writeln!(out, "{tool} {verb}"))?;
            Ok(true)
        }

        ToolCommand::Show { tool } => {
            let row = engine.tool(*tool)?;
            let units = engine.list_units(*tool)?;
            let loans = engine.open_loans_for_tool(*tool)?;
            let now = engine.now();
            let value = json!({ "tool": row, "units": units, "open_loans": loans });
            emit(out, json, &value, |out| {
                write_tool(out, &row)?;
                for unit in &units {
                    write!(out, "  ")?;
                    write_unit(out, unit)?;
                }
                for loan in &loans {
                    write!(out, "  ")?;
                    write_loan(out, loan, now)?;
                }
                Ok(())
            })?;
            Ok(false)
        }

        ToolCommand::List => {
            let tools = engine.tools()?;
            emit(out, json, &tools, |out| {
                tools.iter().try_for_each(|tool| write_tool(out, tool))
            })?;
            Ok(false)
        }
    }
}

fn unit_command<W: Write>(
    session: &Session,
    command: &UnitCommand,
    json: bool,
    out: &mut W,
) -> Result<bool> {
    let engine = &session.engine;
    match command {
        UnitCommand::Add {
            tool,
            count,
            condition,
        } => {
            let condition = condition.unwrap_or(engine.options().replenish_condition);
            let units = engine.create_units(*tool, *count, condition)?;
            emit(out, json, &units, |out| {
                units.iter().try_for_each(|unit| write_unit(out, unit))
            })?;
            Ok(true)
        }

        UnitCommand::Condition {
            unit,
            condition,
            notes,
        } => {
            let unit = engine.set_condition(*unit, *condition, notes.clone())?;
            emit(out, json, &unit, |out| write_unit(out, &unit))?;
            Ok(true)
        }

        UnitCommand::List { tool, available } => {
            let units = if *available {
                engine.list_available(*tool)?
            } else {
                engine.list_units(*tool)?
            };
            emit(out, json, &units, |out| {
                units.iter().try_for_each(|unit| write_unit(out, unit))
            })?;
            Ok(false)
        }
    }
}

fn material_command<W: Write>(
    session: &Session,
    command: &MaterialCommand,
    json: bool,
    out: &mut W,
) -> Result<bool> {
    let engine = &session.engine;
    match command {
        MaterialCommand::Add {
            name,
            category,
            quantity,
            threshold,
            unit,
        } => {
            let material = engine.create_material(NewMaterial {
                name: name.clone(),
                category_id: *category,
                current_quantity: *quantity,
                threshold_quantity: *threshold,
                unit: unit.clone(),
            })?;
            emit(out, json, &material, |out| write_material(out, &material))?;
            Ok(true)
        }

        MaterialCommand::Update {
            material,
            quantity,
            threshold,
        } => {
            let threshold = match threshold {
                Some(threshold) => *threshold,
                None => engine.material(*material)?.threshold_quantity,
            };
            let material = engine.update_material_quantity(*material, *quantity, threshold)?;
            emit(out, json, &material, |out| write_material(out, &material))?;
            Ok(true)
        }

        MaterialCommand::List { low } => {
            let materials = if *low {
                engine.low_stock_materials()?
            } else {
                engine.materials()?
            };
            emit(out, json, &materials, |out| {
                materials.iter().try_for_each(|m| write_material(out, m))
            })?;
            Ok(false)
        }

        MaterialCommand::History => {
            let history = engine.consumptions()?;
            emit(out, json, &history, |out| {
                history.iter().try_for_each(|c| write_consumption(out, c))
            })?;
            Ok(false)
        }
    }
}

// ============================================================================
// Request building
// ============================================================================

/// Build a borrow request. Explicit units of one tool share a line.
fn borrow_request(
    borrower: &str,
    due: DateTime<Utc>,
    purpose: &str,
    quantities: &[(ToolId, u32)],
    units: &[(ToolId, UnitId)],
) -> BorrowRequest {
    let mut explicit: Vec<(ToolId, Vec<UnitId>)> = Vec::new();
    for &(tool_id, unit_id) in units {
        match explicit.iter_mut().find(|(t, _)| *t == tool_id) {
            Some((_, ids)) => ids.push(unit_id),
            None => explicit.push((tool_id, vec![unit_id])),
        }
    }

    let mut request = BorrowRequest::new(borrower, due).with_purpose(purpose);
    for (tool_id, ids) in explicit {
        request = request.with_units(tool_id, ids);
    }
    for &(tool_id, quantity) in quantities {
        request = request.with_quantity(tool_id, quantity);
    }
    request
}

/// Build a return request covering `loan`.
///
/// Units named in `overrides` (by tool unit id) get their own condition, the
/// rest get `default`. Without a default, unnamed units are left out and the
/// engine rejects the return as incomplete.
fn return_request(
    loan: &BorrowingTransaction,
    default: Option<Condition>,
    overrides: &[(UnitId, Condition)],
    notes: Option<String>,
) -> Result<ReturnRequest> {
    let overrides: HashMap<UnitId, Condition> = overrides.iter().copied().collect();
    if let Some(stray) = overrides.keys().find(|id| !loan.unit_ids().any(|u| u == **id)) {
        bail!("{stray} is not part of {}", loan.id);
    }

    let mut request = ReturnRequest::new(loan.id);
    for item in &loan.items {
        for unit in &item.units {
            if let Some(condition) = overrides.get(&unit.tool_unit_id).copied().or(default) {
                request = request.with_unit(item.id, unit.id, condition);
            }
        }
    }
    if let Some(notes) = notes {
        request = request.with_notes(notes);
    }
    Ok(request)
}

/// Build a consume request, attaching prices to their lines.
fn consume_request(
    consumer: &str,
    purpose: &str,
    project: Option<&str>,
    items: &[(MaterialId, Decimal)],
    prices: &[(MaterialId, Decimal)],
) -> Result<ConsumeRequest> {
    if let Some((stray, _)) = prices
        .iter()
        .find(|(id, _)| !items.iter().any(|(m, _)| m == id))
    {
        bail!("price given for {stray}, which is not consumed");
    }

    let mut request = ConsumeRequest::new(consumer).with_purpose(purpose);
    if let Some(project) = project {
        request = request.with_project(project);
    }
    for &(material_id, quantity) in items {
        request = match prices.iter().find(|(id, _)| *id == material_id) {
            Some(&(_, price)) => request.with_priced_item(material_id, quantity, price),
            None => request.with_item(material_id, quantity),
        };
    }
    Ok(request)
}

// ============================================================================
// Output
// ============================================================================

fn emit<W: Write, T: Serialize>(
    out: &mut W,
    json: bool,
    value: &T,
    text: impl FnOnce(&mut W) -> io::Result<()>,
) -> Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, value)?;
        writeln!(out)?;
    } else {
        text(out)?;
    }
    Ok(())
}

fn write_tool<W: Write>(out: &mut W, tool: &Tool) -> io::Result<()> {
    write!(
        out,
        "{}  {}  {}/{} available",
        tool.id, tool.name, tool.available_quantity, tool.total_quantity
    )?;
    if let Some(location) = &tool.location {
        write!(out, "  @ {location}")?;
    }
    if tool.is_archived() {
        write!(out, "  (archived)")?;
    }
    writeln!(out)
}

fn write_unit<W: Write>(out: &mut W, unit: &ToolUnit) -> io::Result<()> {
    let state = if unit.is_available { "in" } else { "out" };
    write!(out, "{}  #{}  {}  {state}", unit.id, unit.unit_number, unit.condition)?;
    if let Some(notes) = &unit.notes {
        write!(out, "  {notes}")?;
    }
    writeln!(out)
}

fn write_loan<W: Write>(
    out: &mut W,
    loan: &BorrowingTransaction,
    now: DateTime<Utc>,
) -> io::Result<()> {
    write!(
        out,
        "{}  {}  {}  due {}  {} unit(s)",
        loan.id,
        loan.effective_status(now),
        loan.borrower_name,
        loan.due_date.format("%Y-%m-%d %H:%M"),
        loan.total_quantity()
    )?;
    let late = loan.days_overdue(now);
    if late > 0 {
        write!(out, "  {late} day(s) overdue")?;
    }
    writeln!(out)
}

fn write_material<W: Write>(out: &mut W, material: &Material) -> io::Result<()> {
    write!(
        out,
        "{}  {}  {} {} (reorder at {})",
        material.id,
        material.name,
        material.current_quantity,
        material.unit,
        material.threshold_quantity
    )?;
    if material.is_low_stock() {
        write!(out, "  LOW")?;
    }
    writeln!(out)
}

fn write_consumption<W: Write>(
    out: &mut W,
    consumption: &ConsumptionTransaction,
) -> io::Result<()> {
    write!(
        out,
        "{}  {}  {}  {} line(s)",
        consumption.id,
        consumption.consumption_date.format("%Y-%m-%d %H:%M"),
        consumption.consumer_name,
        consumption.items.len()
    )?;
    if let Some(value) = consumption.total_value() {
        write!(out, "  value {value}")?;
    }
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use clap::CommandFactory;
    use rust_decimal_macros::dec;
    use toolcrib_core::UnitSelection;
    use toolcrib_engine::Engine;
    use toolcrib_store::MemoryStore;

    #[test]
    fn test_cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_borrow_flags() {
        let args = Args::try_parse_from([
            "toolcrib",
            "borrow",
            "--borrower",
            "Ana",
            "--due",
            "2024-03-05",
            "--quantity",
            "tool-1=2",
            "--unit",
            "tool-9=unit-31",
            "--unit",
            "tool-9=unit-32",
        ])
        .unwrap();
        let Command::Borrow {
            quantities, units, ..
        } = args.command
        else {
            panic!("expected borrow");
        };
        assert_eq!(quantities, vec![(ToolId(1), 2)]);
        assert_eq!(units, vec![(ToolId(9), UnitId(31)), (ToolId(9), UnitId(32))]);
    }

    #[test]
    fn test_borrow_request_groups_explicit_units() {
        let due = Utc.with_ymd_and_hms(2024, 3, 5, 17, 0, 0).unwrap();
        let request = borrow_request(
            "Ana",
            due,
            "Deck",
            &[(ToolId(1), 2)],
            &[(ToolId(9), UnitId(31)), (ToolId(4), UnitId(8)), (ToolId(9), UnitId(32))],
        );

        assert_eq!(request.items.len(), 3);
        assert_eq!(request.items[0].tool_id, ToolId(9));
        assert_eq!(
            request.items[0].selection,
            UnitSelection::Units(vec![UnitId(31), UnitId(32)])
        );
        assert_eq!(request.items[2].selection, UnitSelection::Quantity(2));
    }

    fn lent(units: u32) -> (Engine<MemoryStore>, BorrowingTransaction) {
        let engine = Engine::new(MemoryStore::new());
        let tool = engine
            .create_tool(NewTool::new("Clamp", CategoryId(1), units))
            .unwrap();
        let loan = engine
            .borrow(
                BorrowRequest::new("Ana", Utc::now() + Duration::days(1))
                    .with_quantity(tool.id, units),
            )
            .unwrap();
        (engine, loan)
    }

    #[test]
    fn test_return_request_applies_overrides() {
        let (engine, loan) = lent(3);
        let units: Vec<UnitId> = loan.unit_ids().collect();

        let request =
            return_request(&loan, Some(Condition::Good), &[(units[1], Condition::Poor)], None)
                .unwrap();
        engine.return_loan(request).unwrap();

        assert_eq!(engine.unit(units[0]).unwrap().condition, Condition::Good);
        assert_eq!(engine.unit(units[1]).unwrap().condition, Condition::Poor);
        assert_eq!(engine.unit(units[2]).unwrap().condition, Condition::Good);
    }

    #[test]
    fn test_return_request_without_default_covers_only_named_units() {
        let (_, loan) = lent(2);
        let first = loan.unit_ids().next().unwrap();

        let request = return_request(&loan, None, &[(first, Condition::Fair)], None).unwrap();

        let covered: usize = request.items.iter().map(|i| i.unit_returns.len()).sum();
        assert_eq!(covered, 1);
    }

    #[test]
    fn test_return_request_rejects_foreign_unit() {
        let (_, loan) = lent(1);
        let result = return_request(&loan, None, &[(UnitId(9999), Condition::Good)], None);
        assert!(result.is_err());
    }

    #[test]
    fn test_consume_request_attaches_prices() {
        let request = consume_request(
            "Ben",
            "Shelving",
            Some("Garage"),
            &[(MaterialId(3), dec!(40)), (MaterialId(4), dec!(2))],
            &[(MaterialId(3), dec!(0.05))],
        )
        .unwrap();

        assert_eq!(request.project_name.as_deref(), Some("Garage"));
        assert_eq!(request.items[0].unit_price, Some(dec!(0.05)));
        assert_eq!(request.items[1].unit_price, None);

        let stray = consume_request("Ben", "", None, &[], &[(MaterialId(3), dec!(1))]);
        assert!(stray.is_err());
    }

    #[test]
    fn test_text_output() {
        let mut tool = Tool::new(ToolId(1), CategoryId(1), "Drill");
        tool.total_quantity = 5;
        tool.available_quantity = 3;
        let mut out = Vec::new();
        write_tool(&mut out, &tool).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "tool-1  Drill  3/5 available\n");
    }
}

use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{bail, Result};
use std::io::{self, Write};
use std::path::PathBuf;

use pop_planner::config::AppConfig;
use pop_planner::cost::{average_project_total, group_procedures, portfolio_total, project_total, ProjectSummary};
use pop_planner::edit::{add_resource, delete_resource, edit_resource, set_recurrence, ResourceChange, ResourceOwner};
use pop_planner::export::{export_csv, export_json, export_report, format_brl, open_print_view, ReportOptions};
use pop_planner::model::{Category, Project};
use pop_planner::recurrence::{CalendarDate, IntervalUnit, Recurrence, RecurrenceKind};
use pop_planner::store::FileStore;
use pop_planner::workspace::{AlwaysConfirm, Confirm, Workspace};

#[derive(Parser, Debug)]
#[command(name = "pop-planner")]
#[command(about = "POP Planner - plan procedure costs and print department reports")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create, list, inspect, rename and delete projects
    Project {
        #[command(subcommand)]
        command: ProjectCommand,
    },
    /// Manage the departments of a project
    Department {
        #[command(subcommand)]
        command: DepartmentCommand,
    },
    /// Manage reusable resource groups ("modelos")
    Group {
        #[command(subcommand)]
        command: GroupCommand,
    },
    /// Manage procedures (POPs)
    Procedure {
        #[command(subcommand)]
        command: ProcedureCommand,
    },
    /// Add, edit and delete costed resources
    Resource {
        #[command(subcommand)]
        command: ResourceCommand,
    },
    /// Set or clear how often a procedure runs
    Recurrence {
        #[command(subcommand)]
        command: RecurrenceCommand,
    },
    /// Write the printable HTML report of a project
    Report(ReportArgs),
    /// Export a project to CSV and/or JSON
    Export(ExportArgs),
    /// List every project with its total and the overall total
    Summary,
}

#[derive(Subcommand, Debug)]
enum ProjectCommand {
    List,
    Create { name: String },
    Show { project: String },
    Rename { project: String, name: String },
    Delete {
        project: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
enum DepartmentCommand {
    Add { project: String, name: String },
    Rename {
        project: String,
        department: String,
        name: String,
    },
    /// Set the notes printed on the department's last report page ("" clears them)
    Notes {
        project: String,
        department: String,
        text: String,
    },
    Delete {
        project: String,
        department: String,
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
enum GroupCommand {
    Add {
        #[command(flatten)]
        path: DepartmentPath,
        name: String,
    },
    Rename {
        #[command(flatten)]
        path: DepartmentPath,
        group: String,
        name: String,
    },
    /// Delete a group; procedures using it fall back to no resources
    Delete {
        #[command(flatten)]
        path: DepartmentPath,
        group: String,
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
enum ProcedureCommand {
    Add {
        #[command(flatten)]
        path: DepartmentPath,
        name: String,
        /// Use the resources of this group
        #[arg(long)]
        group: Option<String>,
    },
    Rename {
        #[command(flatten)]
        path: DepartmentPath,
        procedure: String,
        name: String,
    },
    /// Use a group's resources, or the procedure's own when --group is omitted
    Assign {
        #[command(flatten)]
        path: DepartmentPath,
        procedure: String,
        #[arg(long)]
        group: Option<String>,
    },
    Delete {
        #[command(flatten)]
        path: DepartmentPath,
        procedure: String,
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
enum ResourceCommand {
    Add {
        #[command(flatten)]
        path: DepartmentPath,
        #[command(flatten)]
        owner: OwnerArgs,
        /// people, documents, equipment, systems, consumables or locations
        category: Category,
        name: String,
        /// Cost, with "," or "." as decimal separator
        #[arg(allow_hyphen_values = true)]
        cost: String,
        #[arg(long)]
        notes: Option<String>,
    },
    Edit {
        #[command(flatten)]
        path: DepartmentPath,
        #[command(flatten)]
        owner: OwnerArgs,
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, allow_hyphen_values = true)]
        cost: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    Delete {
        #[command(flatten)]
        path: DepartmentPath,
        #[command(flatten)]
        owner: OwnerArgs,
        id: String,
    },
}

#[derive(Subcommand, Debug)]
enum RecurrenceCommand {
    Set {
        #[command(flatten)]
        path: DepartmentPath,
        #[command(flatten)]
        owner: OwnerArgs,
        #[command(flatten)]
        recurrence: RecurrenceArgs,
    },
    Clear {
        #[command(flatten)]
        path: DepartmentPath,
        #[command(flatten)]
        owner: OwnerArgs,
    },
}

#[derive(Args, Debug)]
struct DepartmentPath {
    /// Project id or name
    project: String,
    /// Department id or name
    department: String,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct OwnerArgs {
    /// Target a procedure's own resources
    #[arg(long)]
    procedure: Option<String>,
    /// Target a group's resources
    #[arg(long)]
    group: Option<String>,
}

impl OwnerArgs {
    fn owner(&self) -> ResourceOwner<'_> {
        match (&self.group, &self.procedure) {
            (Some(group), _) => ResourceOwner::Group(group),
            (None, procedure) => ResourceOwner::Procedure(procedure.as_deref().unwrap_or_default()),
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum KindArg {
    Once,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    SpecificDates,
    Custom,
}

#[derive(Args, Debug)]
struct RecurrenceArgs {
    #[arg(value_enum)]
    kind: KindArg,
    /// Time of day, HH:MM
    #[arg(long)]
    time: Option<String>,
    /// Weekday numbers, 0 = Sunday (weekly)
    #[arg(long, value_delimiter = ',')]
    weekdays: Vec<u8>,
    /// Day of the month (monthly)
    #[arg(long)]
    day: Option<u8>,
    /// Last year of execution (yearly)
    #[arg(long)]
    end_year: Option<i32>,
    /// YYYY-MM-DD dates (specific-dates)
    #[arg(long, value_delimiter = ',')]
    dates: Vec<CalendarDate>,
    /// Repeat every N units (custom)
    #[arg(long)]
    interval: Option<u32>,
    /// days, weeks, months or years (custom)
    #[arg(long)]
    unit: Option<IntervalUnit>,
    #[arg(long)]
    start: Option<CalendarDate>,
    #[arg(long)]
    end: Option<CalendarDate>,
    #[arg(long)]
    notes: Option<String>,
}

impl RecurrenceArgs {
    fn to_recurrence(&self) -> Recurrence {
        let kind = match self.kind {
            KindArg::Once => RecurrenceKind::Once,
            KindArg::Daily => RecurrenceKind::Daily,
            KindArg::Weekly => RecurrenceKind::Weekly {
                weekdays: self.weekdays.clone(),
            },
            KindArg::Monthly => RecurrenceKind::Monthly { day_of_month: self.day },
            KindArg::Yearly => RecurrenceKind::Yearly { end_year: self.end_year },
            KindArg::SpecificDates => RecurrenceKind::SpecificDates {
                dates: self.dates.clone(),
            },
            KindArg::Custom => RecurrenceKind::Custom {
                interval: self.interval,
                unit: self.unit,
            },
        };

        let mut recurrence = Recurrence::new(kind);
        if let Some(time) = &self.time {
            recurrence = recurrence.at(time.clone());
        }
        if let Some(start) = self.start {
            recurrence = recurrence.starting(start);
        }
        if let Some(end) = self.end {
            recurrence = recurrence.ending(end);
        }
        if let Some(notes) = &self.notes {
            recurrence = recurrence.with_notes(notes.clone());
        }
        recurrence
    }
}

#[derive(Args, Debug)]
struct ReportArgs {
    project: String,
    /// Leave out cell subtotals and department totals
    #[arg(long)]
    no_subtotals: bool,
    /// Output path (default: relatorio-<project id>.html)
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,
    /// Open the report in the default browser to print it
    #[arg(long)]
    open: bool,
}

#[derive(Args, Debug)]
struct ExportArgs {
    project: String,
    /// Export the cost breakdown to CSV
    #[arg(long, value_name = "FILE")]
    csv: Option<PathBuf>,
    /// Export the project and its totals to JSON
    #[arg(long, value_name = "FILE")]
    json: Option<PathBuf>,
}

/// Reads a yes/no answer from stdin; anything but "s"/"sim"/"y"/"yes" declines.
struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        eprint!("{prompt} [s/N] ");
        if io::stderr().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        if io::stdin().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_lowercase().as_str(), "s" | "sim" | "y" | "yes")
    }
}

fn confirmer(yes: bool) -> &'static dyn Confirm {
    if yes {
        &AlwaysConfirm
    } else {
        &StdinConfirm
    }
}

pub fn run(cli: Cli, config: &AppConfig) -> Result<()> {
    let store = FileStore::new(&config.storage.data_dir);
    let mut workspace = Workspace::open(store, config.storage.key.as_str());

    match cli.command {
        Command::Project { command } => project(&mut workspace, command)?,
        Command::Department { command } => department(&mut workspace, command)?,
        Command::Group { command } => group(&mut workspace, command)?,
        Command::Procedure { command } => procedure(&mut workspace, command)?,
        Command::Resource { command } => resource(&mut workspace, command)?,
        Command::Recurrence { command } => recurrence(&mut workspace, command)?,
        Command::Report(args) => report(&workspace, config, &args)?,
        Command::Export(args) => export(&workspace, &args)?,
        Command::Summary => summary(&workspace),
    }

    if workspace.last_save_failed() {
        eprintln!(
            "Warning: changes could not be saved to {}; they are lost when this command exits.",
            workspace.store().path_for(workspace.key()).display()
        );
    }
    Ok(())
}

type Ws = Workspace<FileStore>;

fn declined() {
    println!("Cancelled.");
}

fn project(ws: &mut Ws, command: ProjectCommand) -> Result<()> {
    match command {
        ProjectCommand::List => {
            if ws.projects().is_empty() {
                println!("No projects yet.");
            }
            for project in ws.projects() {
                println!(
                    "{}  {}  ({} departments, {} procedures, {} groups)  {}",
                    project.id,
                    project.name,
                    project.departments.len(),
                    project.total_procedures(),
                    project.total_groups(),
                    format_brl(project_total(project))
                );
            }
        }
        ProjectCommand::Create { name } => {
            let id = ws.create_project(&name)?;
            println!("Created project {id}");
        }
        ProjectCommand::Show { project } => print_project(ws.project(&project)?),
        ProjectCommand::Rename { project, name } => {
            ws.edit_project(&project, |p| p.rename(&name))?;
            println!("Renamed project to {}", name.trim());
        }
        ProjectCommand::Delete { project, yes } => match ws.delete_project(&project, confirmer(yes))? {
            Some(removed) => println!("Deleted project {}", removed.name),
            None => declined(),
        },
    }
    Ok(())
}

fn department(ws: &mut Ws, command: DepartmentCommand) -> Result<()> {
    match command {
        DepartmentCommand::Add { project, name } => {
            let id = ws.edit_project(&project, |p| p.add_department(&name).map(|d| d.id.clone()))?;
            println!("Added department {id}");
        }
        DepartmentCommand::Rename {
            project,
            department,
            name,
        } => {
            ws.edit_project(&project, |p| p.department_mut(&department)?.rename(&name))?;
            println!("Renamed department to {}", name.trim());
        }
        DepartmentCommand::Notes {
            project,
            department,
            text,
        } => {
            ws.edit_project(&project, |p| {
                p.department_mut(&department)?.set_notes(Some(text.as_str()));
                Ok(())
            })?;
            println!("Updated notes");
        }
        DepartmentCommand::Delete {
            project,
            department,
            yes,
        } => match ws.delete_department(&project, &department, confirmer(yes))? {
            Some(removed) => println!("Deleted department {}", removed.name),
            None => declined(),
        },
    }
    Ok(())
}

fn group(ws: &mut Ws, command: GroupCommand) -> Result<()> {
    match command {
        GroupCommand::Add { path, name } => {
            let id = ws.edit_project(&path.project, |p| {
                p.department_mut(&path.department)?
                    .add_group(&name)
                    .map(|g| g.id.clone())
            })?;
            println!("Added group {id}");
        }
        GroupCommand::Rename { path, group, name } => {
            ws.edit_project(&path.project, |p| {
                p.department_mut(&path.department)?.group_mut(&group)?.rename(&name)
            })?;
            println!("Renamed group to {}", name.trim());
        }
        GroupCommand::Delete { path, group, yes } => {
            match ws.delete_group(&path.project, &path.department, &group, confirmer(yes))? {
                Some((removed, detached)) => {
                    println!("Deleted group {} ({detached} procedures detached)", removed.name);
                }
                None => declined(),
            }
        }
    }
    Ok(())
}

fn procedure(ws: &mut Ws, command: ProcedureCommand) -> Result<()> {
    match command {
        ProcedureCommand::Add { path, name, group } => {
            let id = ws.edit_project(&path.project, |p| {
                let department = p.department_mut(&path.department)?;
                let id = department.add_procedure(&name)?.id.clone();
                if let Some(group) = group.as_deref() {
                    department.assign_group(&id, Some(group))?;
                }
                Ok(id)
            })?;
            println!("Added procedure {id}");
        }
        ProcedureCommand::Rename {
            path,
            procedure,
            name,
        } => {
            ws.edit_project(&path.project, |p| {
                p.department_mut(&path.department)?
                    .procedure_mut(&procedure)?
                    .rename(&name)
            })?;
            println!("Renamed procedure to {}", name.trim());
        }
        ProcedureCommand::Assign {
            path,
            procedure,
            group,
        } => {
            ws.edit_project(&path.project, |p| {
                p.department_mut(&path.department)?
                    .assign_group(&procedure, group.as_deref())
            })?;
            match group {
                Some(group) => println!("Procedure now uses group {group}"),
                None => println!("Procedure now uses its own resources"),
            }
        }
        ProcedureCommand::Delete { path, procedure, yes } => {
            match ws.delete_procedure(&path.project, &path.department, &procedure, confirmer(yes))? {
                Some(removed) => println!("Deleted procedure {}", removed.name),
                None => declined(),
            }
        }
    }
    Ok(())
}

fn resource(ws: &mut Ws, command: ResourceCommand) -> Result<()> {
    match command {
        ResourceCommand::Add {
            path,
            owner,
            category,
            name,
            cost,
            notes,
        } => {
            let id = ws.edit_project(&path.project, |p| {
                let resources = p.department_mut(&path.department)?.resources_mut(owner.owner())?;
                add_resource(resources, category, &name, &cost, notes.as_deref())
            })?;
            println!("Added resource {id}");
        }
        ResourceCommand::Edit {
            path,
            owner,
            id,
            name,
            cost,
            notes,
        } => {
            let change = ResourceChange {
                name: name.as_deref(),
                cost: cost.as_deref(),
                notes: notes.as_deref(),
            };
            ws.edit_project(&path.project, |p| {
                let resources = p.department_mut(&path.department)?.resources_mut(owner.owner())?;
                edit_resource(resources, &id, &change)
            })?;
            println!("Updated resource {id}");
        }
        ResourceCommand::Delete { path, owner, id } => {
            let removed = ws.edit_project(&path.project, |p| {
                let resources = p.department_mut(&path.department)?.resources_mut(owner.owner())?;
                delete_resource(resources, &id)
            })?;
            println!("Deleted resource {}", removed.name);
        }
    }
    Ok(())
}

fn recurrence(ws: &mut Ws, command: RecurrenceCommand) -> Result<()> {
    match command {
        RecurrenceCommand::Set {
            path,
            owner,
            recurrence,
        } => {
            let recurrence = recurrence.to_recurrence();
            ws.edit_project(&path.project, |p| {
                let resources = p.department_mut(&path.department)?.resources_mut(owner.owner())?;
                set_recurrence(resources, Some(&recurrence))
            })?;
            println!("Recurrence set: {}", recurrence.to_resource().name);
        }
        RecurrenceCommand::Clear { path, owner } => {
            ws.edit_project(&path.project, |p| {
                let resources = p.department_mut(&path.department)?.resources_mut(owner.owner())?;
                set_recurrence(resources, None)
            })?;
            println!("Recurrence cleared");
        }
    }
    Ok(())
}

fn report(ws: &Ws, config: &AppConfig, args: &ReportArgs) -> Result<()> {
    let project = ws.project(&args.project)?;
    let options = ReportOptions {
        show_subtotals: !args.no_subtotals,
        print_delay_ms: config.report.print_delay_ms,
    };
    let path = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("relatorio-{}.html", project.id)));

    export_report(project, &options, &path)?;
    println!("Report written to {}", path.display());

    if args.open {
        open_print_view(&path)?;
    }
    Ok(())
}

fn export(ws: &Ws, args: &ExportArgs) -> Result<()> {
    if args.csv.is_none() && args.json.is_none() {
        bail!("nothing to export: pass --csv FILE and/or --json FILE");
    }
    let project = ws.project(&args.project)?;

    if let Some(csv_path) = &args.csv {
        export_csv(project, csv_path)?;
        println!("Exported to CSV: {}", csv_path.display());
    }

    if let Some(json_path) = &args.json {
        export_json(project, json_path)?;
        println!("Exported to JSON: {}", json_path.display());
    }
    Ok(())
}

fn summary(ws: &Ws) {
    for project in ws.projects() {
        println!("{:<40} {:>18}", project.name, format_brl(project_total(project)));
    }
    println!("{:<40} {:>18}", "TOTAL", format_brl(portfolio_total(ws.projects())));
    println!("{:<40} {:>18}", "Projects", ws.projects().len());
    println!("{:<40} {:>18}", "Average per project", format_brl(average_project_total(ws.projects())));
}

fn print_project(project: &Project) {
    let summary = ProjectSummary::build(project);
    println!("{} ({})", project.name, project.id);

    for (department, totals) in project.departments.iter().zip(&summary.departments) {
        println!();
        println!(
            "  {} ({})  {} procedures, {} groups  {}",
            department.name,
            department.id,
            totals.procedures,
            totals.groups,
            format_brl(totals.report_total)
        );
        for group in &department.resource_groups {
            println!(
                "    Modelo: {} ({})  used by {} procedures",
                group.name,
                group.id,
                department.procedures_using(&group.id).count()
            );
        }
        for row in group_procedures(department) {
            let template = row.group.map(|g| format!("  [Modelo: {}]", g.name)).unwrap_or_default();
            println!("    {}{template}", row.procedure_names.join(", "));
            for (category, items) in row.resources.iter() {
                for item in items {
                    println!(
                        "      {:<14} {:<32} {:>14}  {}",
                        category.label(),
                        item.name,
                        format_brl(item.cost),
                        item.id
                    );
                }
            }
        }
        if let Some(notes) = &department.notes {
            println!("    Observações: {notes}");
        }
    }

    println!();
    for (category, total) in &summary.category_totals {
        println!("  {:<14} {:>18}", category.label(), format_brl(*total));
    }
    println!("  {:<14} {:>18}", "Total", format_brl(summary.total));
}

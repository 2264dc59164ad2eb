//! Command implementations

use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::Path;

use anyhow::{Context, Result};
use dv_core::{get_closest_time_pairs, CellValue, Time, Timeline};
use dv_data::{IngestConfig, LegacyVariablesAndEntityKey, PopulationMap, Table};
use tracing::info;

use crate::cli::{Args, Command};

pub fn run(args: Args) -> Result<()> {
    let table = load_table(&args)?;
    let table = apply_filters(table, &args)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match args.command {
        Command::Stats { preview } => stats(&table, preview, &mut out),
        Command::Export {
            delimiter,
            limit,
            output,
        } => {
            let delimiter = u8::try_from(delimiter)
                .with_context(|| format!("delimiter {:?} is not a single byte", delimiter))?;
            let text = table.to_delimited(delimiter, limit)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, text)
                        .with_context(|| format!("writing {}", path.display()))?;
                    info!("Exported {} rows to {:?}", table.num_rows(), path);
                    Ok(())
                }
                None => Ok(out.write_all(text.as_bytes())?),
            }
        }
        Command::Times {
            columns,
            from,
            to,
            single,
        } => times(&table, &columns, from, to, single, &mut out),
        Command::Values {
            column,
            at,
            tolerance,
        } => values(&table, &column, &at, tolerance, &mut out),
        Command::Pairs { a, b, max_diff } => pairs(&table, &a, &b, max_diff, &mut out),
    }
}

fn load_table(args: &Args) -> Result<Table> {
    let config = match &args.config {
        Some(path) => IngestConfig::from_path(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => IngestConfig::default(),
    };

    let input = if args.input == Path::new("-") {
        LegacyVariablesAndEntityKey::from_reader(io::stdin().lock())?
    } else {
        let file = File::open(&args.input)
            .with_context(|| format!("opening {}", args.input.display()))?;
        LegacyVariablesAndEntityKey::from_reader(BufReader::new(file))
            .with_context(|| format!("parsing {}", args.input.display()))?
    };

    Ok(Table::from_legacy(&input, &config)?)
}

fn apply_filters(mut table: Table, args: &Args) -> Result<Table> {
    if args.start.is_some() || args.end.is_some() {
        table = table.filter_by_time_range(args.start, args.end)?;
    }

    if let (Some(min_population), Some(path)) = (args.min_population, &args.population) {
        let populations = PopulationMap::from_path(path)
            .with_context(|| format!("loading populations {}", path.display()))?;
        table = table.filter_by_population_except(min_population, args.keep.as_slice(), &populations)?;
    }

    if !args.entities.is_empty() {
        table = table.filter_by_entity_names(args.entities.as_slice())?;
    }

    Ok(table)
}

fn format_time(table: &Table, time: Time) -> Result<String> {
    Ok(table.get(table.time_slug())?.format_value(&CellValue::Int(time)))
}

fn stats(table: &Table, preview: usize, out: &mut impl Write) -> Result<()> {
    writeln!(out, "{}", table.describe(preview)?)?;

    for def in table.schema().value_columns() {
        let column = table.get(&def.slug)?;
        let range = match (column.min_value(), column.max_value()) {
            (Some(min), Some(max)) => format!(
                "{} to {}",
                column.format_value(&CellValue::Number(min)),
                column.format_value(&CellValue::Number(max))
            ),
            _ => "-".to_string(),
        };
        writeln!(
            out,
            "{}\t{}\t{}\t{} values\t{} entities\ttolerance {}\t{}",
            column.slug(),
            column.kind(),
            column.name(),
            column.num_values(),
            column.uniq_entity_names().len(),
            column.tolerance(),
            range
        )?;
    }
    Ok(())
}

fn times(
    table: &Table,
    columns: &[String],
    from: f64,
    to: f64,
    single: bool,
    out: &mut impl Write,
) -> Result<()> {
    let times = if columns.is_empty() {
        table.all_times()
    } else {
        table.get_times_uniq_sorted_asc_for_columns(columns)?
    };

    for &time in &times {
        writeln!(out, "{}", format_time(table, time)?)?;
    }

    let timeline = Timeline::new(times);
    timeline.set_single_time(single);
    timeline.set_bounds(from, to);

    if let (Some(start), Some(end)) = (timeline.start_time(), timeline.end_time()) {
        writeln!(
            out,
            "timeline: {} to {}",
            format_time(table, start)?,
            format_time(table, end)?
        )?;
    }
    Ok(())
}

fn values(
    table: &Table,
    slug: &str,
    targets: &[f64],
    tolerance: Option<Time>,
    out: &mut impl Write,
) -> Result<()> {
    let column = table.get(slug)?;
    let targets = if targets.is_empty() {
        vec![f64::INFINITY]
    } else {
        targets.to_vec()
    };
    let tolerance = tolerance.unwrap_or_else(|| column.tolerance());

    let resolved = dv_core::values_by_entity_at_times(
        column.value_by_entity_name_and_time(),
        &targets,
        tolerance,
    );

    for (entity, values) in &resolved {
        let cells: Vec<String> = values
            .iter()
            .map(|dv| match (dv.time, &dv.value) {
                (Some(time), Some(value)) => Ok(format!(
                    "{} ({})",
                    column.format_value(value),
                    format_time(table, time)?
                )),
                _ => Ok("-".to_string()),
            })
            .collect::<Result<_>>()?;
        writeln!(out, "{}\t{}", entity, cells.join("\t"))?;
    }
    Ok(())
}

fn pairs(
    table: &Table,
    slug_a: &str,
    slug_b: &str,
    max_diff: Option<Time>,
    out: &mut impl Write,
) -> Result<()> {
    let a = table.get(slug_a)?;
    let b = table.get(slug_b)?;

    for (entity, series_a) in a.value_by_entity_name_and_time() {
        let Some(series_b) = b.value_by_entity_name_and_time().get(entity) else {
            continue;
        };

        for (time_a, time_b) in get_closest_time_pairs(series_a.times(), series_b.times(), max_diff) {
            let value_a = series_a.get(time_a).map_or_else(String::new, |v| a.format_value(v));
            let value_b = series_b.get(time_b).map_or_else(String::new, |v| b.format_value(v));
            writeln!(
                out,
                "{}\t{}\t{}\t{}\t{}",
                entity,
                format_time(table, time_a)?,
                value_a,
                format_time(table, time_b)?,
                value_b
            )?;
        }
    }
    Ok(())
}

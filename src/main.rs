//! colquery - run a sample join to compare execution strategies

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use colquery::{Expression, OrderSpecifier, QueryBuilder, QueryConfig, Value};
use std::time::Instant;

/// Joins generated `people` and `orders` collections and prints the result
#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of people; every person gets three orders
    #[arg(short, long, default_value = "1000")]
    size: i32,

    /// Only list people at least this old
    #[arg(short = 'a', long, default_value = "60")]
    min_age: i32,

    /// Also match orders above this amount, whatever the buyer's age
    #[arg(long)]
    big_spender: Option<i32>,

    /// Print at most this many rows
    #[arg(short, long, default_value = "10")]
    limit: usize,

    /// Keep join targets in registration order
    #[arg(long)]
    no_sort_sources: bool,

    /// Filter a full cross join instead of pruning during the join
    #[arg(long)]
    no_filter_during_join: bool,

    /// Run a top-level OR as two enumerations
    #[arg(long)]
    or_union: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn people(size: i32) -> Vec<Value> {
    (0..size)
        .map(|id| {
            Value::record([
                ("id", Value::Int32(id)),
                ("name", Value::from(format!("person{}", id))),
                ("age", Value::Int32(18 + id % 60)),
            ])
        })
        .collect()
}

fn orders(size: i32) -> Vec<Value> {
    (0..size.saturating_mul(3))
        .map(|id| {
            Value::record([
                ("id", Value::Int32(id)),
                ("person_id", Value::Int32(id % size.max(1))),
                ("amount", Value::Int32((id * 37) % 500)),
            ])
        })
        .collect()
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config = QueryConfig::new()
        .with_sort_sources(!args.no_sort_sources)
        .with_filter_during_join(!args.no_filter_during_join)
        .with_or_union(args.or_union);

    let person = |name: &str| Expression::field(Expression::source("p"), name);
    let order = |name: &str| Expression::field(Expression::source("o"), name);

    let matched = Expression::eq(person("id"), order("person_id"));
    let old_enough = Expression::and(
        matched.clone(),
        Expression::ge(person("age"), Expression::int32(args.min_age)),
    );
    // A top-level OR, so --or-union can split it
    let predicate = match args.big_spender {
        Some(amount) => Expression::or(
            old_enough,
            Expression::and(
                matched,
                Expression::gt(order("amount"), Expression::int32(amount)),
            ),
        ),
        None => old_enough,
    };

    let query = QueryBuilder::new()
        .from("o", orders(args.size))
        .from("p", people(args.size))
        .filter(predicate)
        .order_by(OrderSpecifier::desc(order("amount")))
        .order_by(OrderSpecifier::asc(person("name")))
        .select(Expression::tuple(vec![
            person("name"),
            person("age"),
            order("amount"),
        ]))
        .config(config)
        .build()
        .context("Failed to build query")?;

    println!("Query: {:?}", query.model());

    let started = Instant::now();
    let count = query.count().context("Failed to count results")?;
    println!("{} matching row(s) counted in {:?}", count, started.elapsed());

    let started = Instant::now();
    let rows = query.iterate().context("Failed to run query")?;
    for row in rows.take(args.limit) {
        let row = row.context("Failed to read result")?;
        println!("  {}", row);
    }
    println!("First {} row(s) in {:?}", args.limit.min(count as usize), started.elapsed());

    Ok(())
}

use anyhow::{bail, Context, Result};
use clap::Parser;
use itertools::{Itertools, MinMaxResult};
use ot_beaver_triplets::cli_utils::{create_channel_pair, ChannelUnion, TripletArgs, TupleType};
use ot_beaver_triplets::fixed_point::DEFAULT_SCALE;
use ot_beaver_triplets::party::{PartyContext, PartyId};
use ot_beaver_triplets::triplet::{reconstruction_error, TripletConfig, TripletGenerator};
use scuttlebutt::AesRng;
use std::time::Instant;
use tracing::{info, Level};

type Generator = TripletGenerator<i64, ChannelUnion, AesRng, DEFAULT_SCALE>;

/// Run one party and return its shares, slot-major.
fn run_party(
    party: PartyId,
    channel: ChannelUnion,
    config: TripletConfig,
    tuple_type: TupleType,
    count: usize,
) -> Result<Vec<i64>> {
    let ctx = PartyContext::new(party, channel, AesRng::new());
    let mut generator =
        Generator::new(ctx, config).with_context(|| format!("@{}:{}", file!(), line!()))?;

    let start = Instant::now();
    generator
        .init()
        .with_context(|| format!("{} failed to run base OTs @{}:{}", party, file!(), line!()))?;
    info!(%party, elapsed = ?start.elapsed(), "base OTs done");

    let start = Instant::now();
    let out = match tuple_type {
        TupleType::Triplet => {
            let mut out = vec![0i64; 3 * count];
            generator.get_triplets(&mut out).with_context(|| {
                format!(
                    "{} failed to generate triplets @{}:{}",
                    party,
                    file!(),
                    line!()
                )
            })?;
            out
        }
        TupleType::Penta => {
            let mut out = vec![0i64; 5 * count];
            generator.get_penta_triplets(&mut out).with_context(|| {
                format!(
                    "{} failed to generate penta triplets @{}:{}",
                    party,
                    file!(),
                    line!()
                )
            })?;
            out
        }
    };
    info!(
        %party,
        elapsed = ?start.elapsed(),
        refills = generator.triplet_refills() + generator.penta_triplet_refills(),
        "{} {}s generated",
        count,
        tuple_type
    );

    Ok(out)
}

/// Errors of each product slot `(lhs, rhs, product)`, from both parties' slot-major shares.
fn product_errors(
    s0: &[i64],
    s1: &[i64],
    count: usize,
    slots: &[(usize, usize, usize)],
) -> Vec<i64> {
    let shares = |s: usize, i: usize| [s0[s * count + i], s1[s * count + i]];

    slots
        .iter()
        .flat_map(|&(l, r, p)| {
            (0..count).map(move |i| {
                reconstruction_error::<DEFAULT_SCALE>(shares(l, i), shares(r, i), shares(p, i))
            })
        })
        .collect()
}

fn main() -> Result<()> {
    let args = TripletArgs::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();

    if args.count == 0 {
        bail!("count must be positive @{}:{}", file!(), line!());
    }

    println!("{:?}", args);

    let (ch0, ch1) = create_channel_pair(args.channel_type, args.port)
        .with_context(|| format!("@{}:{}", file!(), line!()))?;

    let config = args.config();
    let (tuple_type, count) = (args.tuple_type, args.count);

    let start = Instant::now();

    let p1_handle =
        std::thread::spawn(move || run_party(PartyId::P1, ch1, config, tuple_type, count));
    let s0 = run_party(PartyId::P0, ch0, config, tuple_type, count);
    let s1 = p1_handle
        .join()
        .map_err(|_| anyhow::anyhow!("p1 panicked @{}:{}", file!(), line!()))?;

    let (s0, s1) = (s0?, s1?);

    println!("protocol finished: {:?}", start.elapsed());

    let slots: &[(usize, usize, usize)] = match tuple_type {
        TupleType::Triplet => &[(0, 1, 2)],
        TupleType::Penta => &[(0, 2, 3), (1, 2, 4)],
    };
    let errors = product_errors(&s0, &s1, count, slots);

    let mean_abs =
        errors.iter().map(|e| e.unsigned_abs() as f64).sum::<f64>() / errors.len() as f64;
    match errors.iter().minmax() {
        MinMaxResult::NoElements => println!("no products to check"),
        MinMaxResult::OneElement(e) => println!("error: {} units", e),
        MinMaxResult::MinMax(min, max) => {
            println!("error: min {} max {} mean |e| {:.3} units", min, max, mean_abs)
        }
    }

    if args.verbose {
        let k = s0.len() / count;
        let products = slots.iter().map(|&(_, _, p)| p).collect::<Vec<_>>();
        for i in 0..count.min(5) {
            // operands are sums over the integers, products wrap like the shares do
            let tuple = (0..k)
                .map(|s| {
                    let (x0, x1) = (s0[s * count + i], s1[s * count + i]);
                    if products.contains(&s) {
                        x0.wrapping_add(x1) as i128
                    } else {
                        x0 as i128 + x1 as i128
                    }
                })
                .collect::<Vec<_>>();
            let row = (0..slots.len())
                .map(|j| errors[j * count + i])
                .collect::<Vec<_>>();
            println!(
                "{:?} ~ {:?} error {:?}",
                tuple,
                tuple
                    .iter()
                    .map(|&v| v as f64 / (1u64 << DEFAULT_SCALE) as f64)
                    .collect::<Vec<_>>(),
                row
            );
        }
    }

    Ok(())
}

//! Demo driver: submit synthetic workloads and watch the beliefs move.

use anyhow::{bail, Result};
use clap::Parser;
use fluxdispatch::{Buffer, DispatchEnvironment, Task, TaskParams};

#[derive(Parser, Debug)]
#[command(name = "fluxdispatch-demo", about = "Run synthetic tasks through the dispatcher")]
struct Args {
    /// Task type to submit: convolution, gemm or saxpy
    #[arg(long, default_value = "saxpy")]
    task_type: String,

    /// Elements per task (GEMM uses a square matrix of this side length)
    #[arg(long, default_value_t = 64)]
    elements: usize,

    /// How many tasks to run
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Exploration rate override, 0.0..=1.0
    #[arg(long)]
    exploration_rate: Option<f64>,

    /// Skip the belief-store dump after the run
    #[arg(long)]
    no_beliefs: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut env = DispatchEnvironment::new();
    if let Some(rate) = args.exploration_rate {
        env.feedback_mut().exploration_mut().set_rate(rate);
    }

    for i in 0..args.iterations {
        let mut task = build_task(&args.task_type, args.elements, i as u64)?;
        env.execute(&mut task)?;
        let record = env.last_performance_record();
        println!(
            "task {:>3}  path={:<28} flux={:>12.1}  latency={}ns",
            i,
            env.last_plan().map(|p| p.path_name.as_str()).unwrap_or("-"),
            record.holistic_flux,
            record.latency_ns,
        );
    }

    if !args.no_beliefs {
        env.print_beliefs();
    }
    Ok(())
}

fn build_task(task_type: &str, elements: usize, seed: u64) -> Result<Task> {
    fastrand::seed(seed + 1);
    let task = match task_type.to_ascii_lowercase().as_str() {
        "saxpy" => {
            let x: Vec<f32> = (0..elements)
                .map(|_| if fastrand::f32() < 0.3 { 0.0 } else { fastrand::f32() * 2.0 - 1.0 })
                .collect();
            Task::new(seed, "SAXPY", Buffer::F32(x), Buffer::F32(vec![1.0; elements]))
                .with_params(TaskParams::Saxpy { a: 2.0 })
        }
        "convolution" => {
            let signal: Vec<f64> = (0..elements)
                .map(|_| fastrand::f64() * 200.0 - 100.0)
                .collect();
            Task::new(
                seed,
                "CONVOLUTION",
                Buffer::F64(signal),
                Buffer::F64(vec![0.0; elements]),
            )
            .with_input_b(Buffer::F64(vec![0.5, 0.25, 0.125]))
        }
        "gemm" => {
            let side = elements.max(2);
            let dense: Vec<f32> = (0..side * side).map(|_| fastrand::f32()).collect();
            let sparse: Vec<f32> = (0..side * side)
                .map(|_| if fastrand::f32() < 0.8 { 0.0 } else { fastrand::f32() })
                .collect();
            Task::new(
                seed,
                "GEMM",
                Buffer::F32(sparse),
                Buffer::F32(vec![0.0; side * side]),
            )
            .with_input_b(Buffer::F32(dense))
            .with_params(TaskParams::Gemm {
                m: side,
                n: side,
                k: side,
            })
            .with_num_elements(side * side)
        }
        other => bail!("unknown task type: {other}"),
    };
    Ok(task)
}

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use mocasin_rs::config::{self, LoadedScenario, Mapper, RepresentationKind, RunConfig, TraceSpec};
use mocasin_rs::domain::trace::{RandomTraceGenerator, StaticTraceGenerator, TraceGenerator};
use mocasin_rs::errors::EngineError;
use mocasin_rs::observability::messages::{
    engine::SearchCompleted,
    validation::{ObjectiveDemoted, ScenarioRejected},
    StructuredLog,
};
use mocasin_rs::oracle::{SimulationManager, TraceGraphBackend};
use mocasin_rs::representation::{MetricSpace, Representation, SimpleVector};
use mocasin_rs::search::{design_centering, genetic, gradient_descent, random_walk, simulated_annealing};
use mocasin_rs::tracegraph::SlowestPolicy;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::env;
use std::fs;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

fn usage(program: &str) -> String {
    format!(
        "usage: {program} <scenario.yaml> <mapper> [--outdir DIR] [--representation simple_vector|metric_space]\n\
         mappers: random_walk, genetic, sa, gd, dc\n\
         --objectives exec_time,static_energy,dynamic_energy,resource:<kind> (genetic only; default exec_time)"
    )
}

fn parse_args(args: &[String]) -> Result<(String, RunConfig), String> {
    if args.len() < 3 {
        return Err(usage(&args[0]));
    }
    let scenario_path = args[1].clone();
    let mut run_config = RunConfig { mapper: Mapper::parse(&args[2]).map_err(|e| e.to_string())?, ..RunConfig::default() };

    let mut i = 3;
    while i < args.len() {
        match args[i].as_str() {
            "--outdir" => {
                i += 1;
                run_config.outdir = args.get(i).cloned().ok_or("--outdir requires a value")?;
            }
            "--representation" => {
                i += 1;
                let name = args.get(i).ok_or("--representation requires a value")?;
                run_config.representation = RepresentationKind::parse(name).map_err(|e| e.to_string())?;
            }
            "--seed" => {
                i += 1;
                run_config.random_seed = args.get(i).ok_or("--seed requires a value")?.parse().map_err(|_| "--seed must be an integer")?;
            }
            "--parallel" => run_config.parallel = true,
            "--jobs" => {
                i += 1;
                run_config.jobs = args.get(i).ok_or("--jobs requires a value")?.parse().map_err(|_| "--jobs must be an integer")?;
            }
            "--dump-cache" => run_config.dump_cache = true,
            "--load-cache" => {
                i += 1;
                run_config.load_cache = Some(args.get(i).ok_or("--load-cache requires a value")?.clone());
            }
            "--objectives" => {
                i += 1;
                let tokens = args.get(i).ok_or("--objectives requires a value")?;
                run_config.obj_exec_time = false;
                run_config.obj_static_energy = false;
                run_config.obj_dynamic_energy = false;
                run_config.obj_resource_kinds.clear();
                for token in tokens.split(',') {
                    match token {
                        "exec_time" => run_config.obj_exec_time = true,
                        "static_energy" => run_config.obj_static_energy = true,
                        "dynamic_energy" => run_config.obj_dynamic_energy = true,
                        other => match other.strip_prefix("resource:") {
                            Some(kind) => run_config.obj_resource_kinds.push(kind.to_string()),
                            None => return Err(format!("unrecognized objective '{other}'")),
                        },
                    }
                }
            }
            other => return Err(format!("unrecognized argument '{other}'\n\n{}", usage(&args[0]))),
        }
        i += 1;
    }

    Ok((scenario_path, run_config))
}

fn mapper_name(mapper: Mapper) -> &'static str {
    match mapper {
        Mapper::RandomWalk => "random_walk",
        Mapper::Genetic => "genetic",
        Mapper::SimulatedAnnealing => "sa",
        Mapper::GradientDescent => "gd",
        Mapper::DesignCentering => "dc",
    }
}

fn build_representation(kind: RepresentationKind, loaded: &LoadedScenario, include_channels: bool) -> Box<dyn Representation> {
    match kind {
        RepresentationKind::SimpleVector => {
            Box::new(SimpleVector::new(loaded.platform.clone(), loaded.kpn.clone(), include_channels, 2.0))
        }
        RepresentationKind::MetricSpace => {
            Box::new(MetricSpace::new(loaded.platform.clone(), loaded.kpn.clone(), include_channels, 2.0))
        }
    }
}

fn trace_factory(spec: TraceSpec) -> Box<dyn Fn() -> Box<dyn TraceGenerator + Send> + Send + Sync> {
    match spec {
        TraceSpec::Static(scripts) => Box::new(move || -> Box<dyn TraceGenerator + Send> { Box::new(StaticTraceGenerator::new(scripts.clone())) }),
        TraceSpec::Random { expected_firings, min_cycles, max_cycles, seed } => {
            Box::new(move || -> Box<dyn TraceGenerator + Send> {
                Box::new(RandomTraceGenerator::new(expected_firings, min_cycles, max_cycles, seed.unwrap_or(0)))
            })
        }
    }
}

async fn run(scenario_path: &str, run_config: RunConfig) -> Result<(), EngineError> {
    let loaded = match config::load_scenario(scenario_path) {
        Ok(loaded) => loaded,
        Err(error) => {
            ScenarioRejected { path: scenario_path, error: &error }.log();
            return Err(error.into());
        }
    };
    run_config.validate(loaded.kpn.processes.len())?;

    let representation = build_representation(run_config.representation, &loaded, run_config.include_channels);
    let factory = trace_factory(loaded.trace);
    let backend = Arc::new(TraceGraphBackend::new(loaded.kpn.clone(), loaded.platform.clone(), factory, SlowestPolicy::default()));
    let manager = SimulationManager::new(backend, run_config.parallel, run_config.jobs, run_config.chunk_size);

    if let Some(cache_path) = &run_config.load_cache {
        manager.load_cache(cache_path).await?;
    }

    let mut rng = StdRng::seed_from_u64(run_config.random_seed);
    fs::create_dir_all(&run_config.outdir).ok();

    let search_started_at = Instant::now();
    let (mapping_summary, best_exec_time) = match run_config.mapper {
        Mapper::RandomWalk => {
            let outcome =
                random_walk::search(&loaded.platform, &loaded.kpn, representation.as_ref(), &manager, run_config.random_walk_samples, &mut rng)
                    .await?;
            (format!("{:?}", outcome.mapping.to_list(run_config.include_channels)?), outcome.result.exec_time)
        }
        Mapper::Genetic => {
            let has_power_model = loaded.platform.processors.iter().any(|p| p.power_model.is_some());
            let mut obj_static_energy = run_config.obj_static_energy;
            let mut obj_dynamic_energy = run_config.obj_dynamic_energy;
            if !has_power_model {
                if obj_static_energy {
                    ObjectiveDemoted { objective: "static_energy", reason: "platform declares no power model" }.log();
                    obj_static_energy = false;
                }
                if obj_dynamic_energy {
                    ObjectiveDemoted { objective: "dynamic_energy", reason: "platform declares no power model" }.log();
                    obj_dynamic_energy = false;
                }
            }
            let objectives = genetic::Objectives {
                exec_time: run_config.obj_exec_time,
                static_energy: obj_static_energy,
                dynamic_energy: obj_dynamic_energy,
                resource_kinds: run_config.obj_resource_kinds.clone(),
            };
            let config = genetic::Config {
                mu: run_config.ga_mu,
                generations: run_config.ga_generations,
                cxpb: run_config.ga_cxpb,
                mutpb: run_config.ga_mutpb,
                tournsize: run_config.ga_tournsize,
                crossover_rate: run_config.ga_crossover_rate,
                mu_plus_lambda: run_config.ga_mu_plus_lambda,
                initial_radius: run_config.ga_initial_radius,
            };
            let outcome =
                genetic::search(&loaded.platform, &loaded.kpn, representation.as_ref(), &manager, &objectives, &config, &mut rng).await?;

            let logbook_lines: Vec<String> = outcome
                .logbook
                .iter()
                .map(|(generation, best_fitness, hof_size)| format!("{generation},{best_fitness},{hof_size}"))
                .collect();
            let logbook_path = format!("{}/evolutionary_logbook.txt", run_config.outdir);
            fs::write(&logbook_path, format!("generation,best_fitness,hall_of_fame_size\n{}\n", logbook_lines.join("\n")))
                .map_err(|source| mocasin_rs::errors::ConfigError::ScenarioIo { path: logbook_path.clone(), source })?;

            let best = outcome.hall_of_fame.iter().min_by_key(|(_, r)| r.exec_time);
            match best {
                Some((mapping, result)) => (format!("{:?}", mapping.to_list(run_config.include_channels)?), result.exec_time),
                None => ("<empty hall of fame>".to_string(), 0),
            }
        }
        Mapper::SimulatedAnnealing => {
            let config = simulated_annealing::Config {
                t0: run_config.sa_t0,
                tf: run_config.sa_tf,
                cooling_factor: run_config.sa_cooling_factor,
                initial_radius: run_config.ga_initial_radius,
            };
            let outcome =
                simulated_annealing::search(&loaded.platform, &loaded.kpn, representation.as_ref(), &manager, &config, &mut rng).await?;
            (format!("{:?}", outcome.mapping.to_list(run_config.include_channels)?), outcome.result.exec_time)
        }
        Mapper::GradientDescent => {
            let config = gradient_descent::Config { iterations: run_config.gd_iterations, stepsize: run_config.gd_stepsize };
            let outcome =
                gradient_descent::search(&loaded.platform, &loaded.kpn, representation.as_ref(), &manager, &config, &mut rng).await?;
            (format!("{:?}", outcome.mapping.to_list(run_config.include_channels)?), outcome.result.exec_time)
        }
        Mapper::DesignCentering => {
            let config = design_centering::Config {
                max_samples: run_config.dc_max_samples,
                adapt_samples: run_config.dc_adapt_samples,
                p_threshold: run_config.dc_p_threshold,
                initial_radius: run_config.dc_initial_radius,
                threshold_exec_time: run_config.dc_threshold_exec_time,
                p_target_points: run_config.dc_p_target_points.clone(),
                step_width_points: run_config.dc_step_width_points.clone(),
            };
            let outcome =
                design_centering::search(&loaded.platform, &loaded.kpn, representation.as_ref(), &manager, &config, &mut rng).await?;
            (
                format!(
                    "{:?} (radius={:.3}, p={:.3})",
                    outcome.mapping.to_list(run_config.include_channels)?,
                    outcome.radius,
                    outcome.empirical_p
                ),
                0,
            )
        }
    };

    let stats_so_far = manager.statistics().await;
    SearchCompleted {
        strategy: mapper_name(run_config.mapper),
        best_exec_time,
        evaluations: stats_so_far.total,
        duration: search_started_at.elapsed(),
    }
    .log();

    let mapping_path = format!("{}/mapping.txt", run_config.outdir);
    fs::write(&mapping_path, &mapping_summary)
        .map_err(|source| mocasin_rs::errors::ConfigError::ScenarioIo { path: mapping_path.clone(), source })?;
    let best_time_path = format!("{}/best_time.txt", run_config.outdir);
    let best_time_ms = best_exec_time as f64 / 1e9;
    fs::write(&best_time_path, best_time_ms.to_string())
        .map_err(|source| mocasin_rs::errors::ConfigError::ScenarioIo { path: best_time_path.clone(), source })?;

    if run_config.dump_cache {
        manager.dump_cache(&format!("{}/mapping_cache.csv", run_config.outdir)).await?;
    }

    if run_config.record_statistics {
        println!(
            "evaluations={} cached={} simulated={} best_exec_time={:?}",
            stats_so_far.total, stats_so_far.cached, stats_so_far.simulated, stats_so_far.best_exec_time
        );
    }

    println!("best mapping: {mapping_summary}");
    println!("best exec_time: {best_exec_time}ps");
    println!("artifacts written to {}", run_config.outdir);

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    let (scenario_path, run_config) = match parse_args(&args) {
        Ok(parsed) => parsed,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::from(2);
        }
    };

    match run(&scenario_path, run_config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}

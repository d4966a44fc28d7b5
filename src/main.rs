// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use clap::Parser;
use k8s_openapi::api::core::v1::Service;
use k8s_openapi::api::networking::v1::Ingress;
use kube::{Api, Client};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use ingress_manager::config::{IngressTemplate, Settings};
use ingress_manager::constants::defaults;
use ingress_manager::controllers::{Controller, EventDispatcher};
use ingress_manager::error::TracingReporter;
use ingress_manager::kubernetes::ChangeFeed;
use ingress_manager::queue::WorkQueue;
use ingress_manager::reconcilers::ServiceReconciler;

/// Creates and removes Ingresses for annotated Services
#[derive(Parser, Debug)]
#[command(name = "ingress-manager", version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = defaults::CONFIG_PATH)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    info!("Starting ingress manager");

    let template = IngressTemplate::from_file(&cli.config)?;
    let settings = Arc::new(Settings::new(template));
    info!(
        "Configuration loaded: host_suffix={} path={} port={} class={}",
        settings.template.host(),
        settings.template.path(),
        settings.template.port(),
        settings.template.ingress_class_name()
    );

    // Kubeconfig first, in-cluster service account otherwise
    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;
    info!("Connected to Kubernetes cluster");

    let service_feed = ChangeFeed::new(Api::<Service>::all(client.clone()));
    let ingress_feed = ChangeFeed::new(Api::<Ingress>::all(client.clone()));
    let services = service_feed.store();
    let ingresses = ingress_feed.store();

    let queue = WorkQueue::new("ingress-manager");
    let dispatcher = Arc::new(EventDispatcher::new(queue.clone(), settings.clone()));

    let service_dispatcher = dispatcher.clone();
    let feeds = tokio::spawn(async move {
        tokio::join!(
            service_feed.run(move |event| service_dispatcher.on_service_event(event)),
            ingress_feed.run(move |event| dispatcher.on_ingress_event(event)),
        );
    });

    info!("Waiting for caches to sync...");
    services
        .wait_until_ready()
        .await
        .context("Service cache closed before sync")?;
    ingresses
        .wait_until_ready()
        .await
        .context("Ingress cache closed before sync")?;
    info!("Caches synced");

    let reconciler = ServiceReconciler::new(client, services, ingresses, settings.clone());
    let controller = Controller::new(queue, reconciler, Arc::new(TracingReporter), settings);
    controller.run(shutdown_signal()).await;

    feeds.abort();
    info!("Ingress manager stopped");
    Ok(())
}

/// Resolves on SIGINT or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl-C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}

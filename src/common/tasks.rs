// src/common/tasks.rs

use std::{panic::AssertUnwindSafe, time::Duration};

use futures::FutureExt;
use tokio_util::task::TaskTracker;
use tracing::Instrument;

/// Tarefas em segundo plano disparadas pelas requisições (ex.: notificações
/// de pedido novo). A resposta não espera por elas, mas o processo espera
/// (com limite) antes de encerrar.
#[derive(Clone, Default)]
pub struct BackgroundTasks {
    tracker: TaskTracker,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra e inicia uma tarefa. Um panic é capturado e logado, sem
    /// afetar as outras tarefas.
    pub fn spawn<F>(&self, name: &'static str, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let span = tracing::info_span!("background_task", task = name);
        let wrapped = async move {
            if let Err(panic_info) = AssertUnwindSafe(future).catch_unwind().await {
                let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                    (*s).to_string()
                } else if let Some(s) = panic_info.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };
                tracing::error!(panic = %panic_msg, "Tarefa em segundo plano entrou em pânico");
            }
        };

        self.tracker.spawn(wrapped.instrument(span));
    }

    /// Fecha o rastreador e espera as tarefas pendentes até `grace`.
    /// Retorna `true` se todas terminaram dentro do prazo.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        self.tracker.close();
        let pending = self.tracker.len();
        if pending > 0 {
            tracing::info!("⏳ Aguardando {} tarefa(s) em segundo plano...", pending);
        }

        match tokio::time::timeout(grace, self.tracker.wait()).await {
            Ok(()) => true,
            Err(_) => {
                tracing::warn!(
                    pending = self.tracker.len(),
                    "Prazo de encerramento esgotado com tarefas pendentes"
                );
                false
            }
        }
    }

    /// Espera as tarefas já disparadas sem fechar o rastreador.
    #[cfg(test)]
    pub async fn wait_idle(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }
}

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

/// 実行の中断要求。クローンは同じ状態を共有する
#[derive(Debug, Clone, Default)]
pub struct InterruptSignal {
    flag: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl InterruptSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// 中断されるまで待つ。すでに中断済みなら即座に返る
    pub async fn triggered(&self) {
        loop {
            let notified = self.notify.notified();
            if self.is_triggered() {
                return;
            }
            notified.await;
        }
    }

    /// Ctrl-C で中断するタスクを起動する。2回目の Ctrl-C でプロセスを終了する
    pub fn install_ctrl_c(&self) {
        let signal = self.clone();
        tokio::spawn(async move {
            let mut received = 0u32;
            while tokio::signal::ctrl_c().await.is_ok() {
                received += 1;
                if received > 1 {
                    tracing::warn!("Second interrupt received, exiting");
                    std::process::exit(130);
                }
                tracing::warn!("Interrupt received, stopping after the current step");
                signal.trigger();
            }
        });
    }
}

/// `fut` を中断と競合させる。中断されたら None
pub async fn until_interrupted<F: Future>(
    interrupt: Option<&InterruptSignal>,
    fut: F,
) -> Option<F::Output> {
    match interrupt {
        Some(signal) => tokio::select! {
            biased;
            _ = signal.triggered() => None,
            out = fut => Some(out),
        },
        None => Some(fut.await),
    }
}

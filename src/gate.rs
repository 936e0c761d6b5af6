//! 并发准入控制
//!
//! 计数闸门：同时在途的外部调用数不超过容量 N。闸门已满时调用方按到达
//! 顺序（FIFO）排队，许可释放后直接交给队首。许可以 RAII 守卫形式返回，
//! 无论受保护的工作成功、失败还是被取消，守卫析构时都会归还许可。

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::backfill_error;
use crate::error::Result;

/// 共享的准入闸门，克隆后指向同一组许可
#[derive(Debug, Clone)]
pub struct AdmissionGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    waiting: Arc<AtomicUsize>,
}

/// 已获得的准入许可，析构时归还
#[derive(Debug)]
pub struct AdmissionPermit {
    _permit: OwnedSemaphorePermit,
}

/// 排队计数守卫：离开等待状态（获得许可或被取消）时计数减一
struct WaitingGuard<'a>(&'a AtomicUsize);

impl<'a> WaitingGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for WaitingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl AdmissionGate {
    /// 创建容量为 `capacity` 的闸门，容量在生命周期内固定
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(backfill_error!(config, "concurrency", "并发上限必须大于0"));
        }
        if capacity > Semaphore::MAX_PERMITS {
            return Err(backfill_error!(
                config,
                "concurrency",
                format!("并发上限不能超过 {}", Semaphore::MAX_PERMITS)
            ));
        }

        Ok(Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            waiting: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// 获取一个许可；闸门已满时按 FIFO 顺序挂起等待
    ///
    /// tokio 的信号量是公平的，等待者按调用 `acquire` 的顺序被唤醒。
    pub async fn acquire(&self) -> Result<AdmissionPermit> {
        let _waiting = WaitingGuard::enter(&self.waiting);
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| backfill_error!(translation, "准入闸门已关闭"))?;
        Ok(AdmissionPermit { _permit: permit })
    }

    /// 闸门容量
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 当前在途（已发放未归还）的许可数
    pub fn in_flight(&self) -> usize {
        self.capacity - self.semaphore.available_permits()
    }

    /// 当前排队等待许可的调用数
    pub fn waiting(&self) -> usize {
        self.waiting.load(Ordering::SeqCst)
    }
}

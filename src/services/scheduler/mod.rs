pub mod manager;
pub mod tasks;

pub use manager::{effective_interval, Scheduler, SchedulerError, Task};
pub use tasks::{CollectionReport, Collector, CollectorContext, DeviceCollector, NodeCollector, PoolCollector};

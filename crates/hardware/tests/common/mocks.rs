use mockall::mock;
use scoreboard_core::core::sched::signals::Operation;
use scoreboard_core::core::sched::traits::{DataMemory, ExecutionUnit};

mock! {
    pub Unit {}
    impl ExecutionUnit for Unit {
        fn start(&mut self, op: Operation, a: u64, b: u64);
        fn tick(&mut self);
        fn result(&self) -> Option<u64>;
        fn consume(&mut self);
        fn cancel(&mut self);
    }
}

mock! {
    pub Memory {}
    impl DataMemory for Memory {
        fn read(&self, addr: u64) -> u64;
        fn write(&mut self, addr: u64, value: u64);
    }
}

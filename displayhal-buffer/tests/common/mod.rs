//! A fake allocator that records every call and can be told to fail.

#![allow(dead_code)]

use displayhal_buffer::{
    AllocationDescriptor, AllocationRequest, AllocatorError, BufferGeometry, BufferHandle,
    HandleFlags, MemoryAllocator, PixelFormat,
};
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Free(AllocationDescriptor),
    Allocate(AllocationRequest),
}

pub struct RecordingAllocator {
    calls: Mutex<Vec<Call>>,
    fail_free: AtomicBool,
    fail_allocate: AtomicBool,
    next_fd: AtomicI32,
}

impl RecordingAllocator {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_free: AtomicBool::new(false),
            fail_allocate: AtomicBool::new(false),
            next_fd: AtomicI32::new(100),
        }
    }

    pub fn failing_free() -> Self {
        let allocator = Self::new();
        allocator.fail_free.store(true, Ordering::SeqCst);
        allocator
    }

    pub fn failing_allocate() -> Self {
        let allocator = Self::new();
        allocator.fail_allocate.store(true, Ordering::SeqCst);
        allocator
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn allocations(&self) -> Vec<AllocationRequest> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Allocate(request) => Some(request),
                Call::Free(_) => None,
            })
            .collect()
    }
}

impl MemoryAllocator for RecordingAllocator {
    fn free(&self, descriptor: &AllocationDescriptor) -> Result<(), AllocatorError> {
        self.calls.lock().unwrap().push(Call::Free(*descriptor));
        if self.fail_free.load(Ordering::SeqCst) {
            return Err(AllocatorError::Backend("injected free failure".to_string()));
        }
        Ok(())
    }

    fn allocate(&self, request: &AllocationRequest) -> Result<AllocationDescriptor, AllocatorError> {
        self.calls.lock().unwrap().push(Call::Allocate(*request));
        if self.fail_allocate.load(Ordering::SeqCst) {
            return Err(AllocatorError::OutOfMemory { requested: request.size, available: 0 });
        }
        Ok(AllocationDescriptor {
            fd: self.next_fd.fetch_add(1, Ordering::SeqCst),
            base: 0x10_0000,
            offset: 0,
            size: request.size,
        })
    }
}

pub const OLD_BACKING: AllocationDescriptor = AllocationDescriptor {
    fd: 5,
    base: 0x8000,
    offset: 0x100,
    size: 4096,
};

pub fn handle_with(format: PixelFormat) -> BufferHandle {
    BufferHandle::new(
        OLD_BACKING,
        BufferGeometry::new(64, 32, format),
        4096,
        HandleFlags::USES_ION,
    )
}

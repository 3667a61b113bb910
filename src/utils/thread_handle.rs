// (C) Copyright IBM Corp. 2025.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::sync::mpsc::{self, Receiver};
use std::thread::JoinHandle;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ThreadStatus<T> {
    Running,
    Finished(T),
    Panicked(String),
}

/// Owns a background thread.
///
/// The thread receives a terminator channel: once the handle is dropped the
/// channel disconnects, which is the signal for the thread to finish.
#[derive(Debug)]
pub(crate) struct ThreadHandle<T> {
    _thread_termination_sender: mpsc::Sender<()>,
    thread_handle: Option<JoinHandle<T>>,
    finished_thread_status_cached: Option<ThreadStatus<T>>,
}

impl<T: Clone + Send + 'static> ThreadHandle<T> {
    pub(crate) fn new<F>(f: F) -> Self
    where
        F: FnOnce(Receiver<()>) -> T,
        F: Send + 'static,
    {
        let (thread_termination_sender, thread_termination_receiver) = mpsc::channel();

        let t: JoinHandle<T> = std::thread::spawn(move || f(thread_termination_receiver));

        Self {
            _thread_termination_sender: thread_termination_sender,
            thread_handle: Some(t),
            finished_thread_status_cached: None,
        }
    }

    pub(crate) fn get_thread_status(&mut self) -> ThreadStatus<T> {
        match self.thread_handle.take() {
            Some(t) if t.is_finished() => {
                let status = match t.join() {
                    Ok(r) => ThreadStatus::Finished(r),
                    Err(e) => {
                        if let Some(panic_msg) = e.downcast_ref::<String>() {
                            ThreadStatus::Panicked(panic_msg.clone())
                        } else if let Some(panic_msg) = e.downcast_ref::<&str>() {
                            ThreadStatus::Panicked(panic_msg.to_string())
                        } else {
                            ThreadStatus::Panicked("Thread panicked".to_string())
                        }
                    }
                };
                self.finished_thread_status_cached = Some(status.clone());
                status
            }
            Some(t) => {
                self.thread_handle = Some(t);
                ThreadStatus::Running
            }
            None => self
                .finished_thread_status_cached
                .clone()
                .unwrap_or(ThreadStatus::Running),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc::RecvError;
    use std::thread::sleep;
    use std::time::Duration;

    use super::*;

    #[test]
    fn neverending_thread() {
        let (tx, rx) = mpsc::channel();
        let mut handle = ThreadHandle::new(move |terminator| {
            // Blocks until the handle is dropped.
            let _ = terminator.recv();
            tx.send(()).unwrap();
        });

        assert_eq!(handle.get_thread_status(), ThreadStatus::Running);
        assert_eq!(handle.get_thread_status(), ThreadStatus::Running);

        drop(handle);
        assert_eq!(rx.recv(), Ok(()));
        assert_eq!(rx.recv().unwrap_err(), RecvError);
    }

    #[test]
    fn finishing_thread() {
        let mut handle = ThreadHandle::new(|_terminator| 42);
        sleep(Duration::from_millis(50));
        assert_eq!(handle.get_thread_status(), ThreadStatus::Finished(42));
        assert_eq!(handle.get_thread_status(), ThreadStatus::Finished(42));
    }

    #[test]
    fn panicking_thread() {
        let mut handle: ThreadHandle<()> = ThreadHandle::new(|_terminator| {
            panic!("panic for test");
        });
        sleep(Duration::from_millis(50));
        assert_eq!(
            handle.get_thread_status(),
            ThreadStatus::Panicked("panic for test".to_string())
        );
        assert_eq!(
            handle.get_thread_status(),
            ThreadStatus::Panicked("panic for test".to_string())
        );
    }
}

pub mod fifo_buffer;

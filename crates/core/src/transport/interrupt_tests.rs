// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use tokio::io::AsyncWriteExt;

use super::*;

#[tokio::test]
async fn plain_read_returns_data() -> anyhow::Result<()> {
    let (mut client, server) = tokio::io::duplex(64);
    let mut reader = InterruptibleRead::new(server);

    client.write_all(b"hello").await?;

    let mut buf = [0u8; 16];
    let outcome = reader.read(&mut buf).await?;
    assert_eq!(outcome, ReadOutcome::Data(5));
    assert_eq!(&buf[..5], b"hello");
    Ok(())
}

#[tokio::test]
async fn eof_is_reported() -> anyhow::Result<()> {
    let (client, server) = tokio::io::duplex(64);
    drop(client);
    let mut reader = InterruptibleRead::new(server);

    let mut buf = [0u8; 16];
    let outcome = reader.read(&mut buf).await?;
    assert_eq!(outcome, ReadOutcome::Eof);
    Ok(())
}

#[tokio::test]
async fn interrupted_read_does_not_lose_subsequent_bytes() -> anyhow::Result<()> {
    let (mut client, server) = tokio::io::duplex(64);
    let mut reader = InterruptibleRead::new(server);

    // Arm the interrupt before the read starts: `Notify` retains one
    // permit, so the first `.notified().await` inside `read` resolves
    // immediately rather than racing the still-empty duplex.
    reader.interrupt_handle().notify_one();

    let mut buf = [0u8; 16];
    let outcome = reader.read(&mut buf).await?;
    assert_eq!(outcome, ReadOutcome::Interrupted);

    // The orphaned read is still outstanding against the duplex; writing
    // now lets it complete, and the next `read` call must observe it.
    client.write_all(b"keystroke").await?;

    let outcome = reader.read(&mut buf).await?;
    assert_eq!(outcome, ReadOutcome::Data(9));
    assert_eq!(&buf[..9], b"keystroke");
    Ok(())
}

#[tokio::test]
async fn orphan_bytes_exceeding_resumed_buffer_are_carried_forward() -> anyhow::Result<()> {
    let (mut client, server) = tokio::io::duplex(64);
    let mut reader = InterruptibleRead::new(server);

    // Interrupted while a 16-byte read is in flight.
    reader.interrupt_handle().notify_one();
    let mut wide = [0u8; 16];
    let outcome = reader.read(&mut wide).await?;
    assert_eq!(outcome, ReadOutcome::Interrupted);

    client.write_all(b"123456789").await?;

    // The orphan (spawned with a 16-byte cap) pulls all 9 bytes, but this
    // call's buffer only has room for 4 — the rest must be buffered, not
    // dropped.
    let mut narrow = [0u8; 4];
    let outcome = reader.read(&mut narrow).await?;
    assert_eq!(outcome, ReadOutcome::Data(4));
    assert_eq!(&narrow, b"1234");

    let mut rest = [0u8; 16];
    let outcome = reader.read(&mut rest).await?;
    assert_eq!(outcome, ReadOutcome::Data(5));
    assert_eq!(&rest[..5], b"56789");
    Ok(())
}
